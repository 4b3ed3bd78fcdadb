// handlers/protected/measurements.rs - /anthropometric, /performance, /health, /measurements
//
// One set of handlers serves all three kinds; the router attaches the kind
// as an extension on each sub-router.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use super::utils::parse_id;
use crate::database::models::{MeasurementKind, MeasurementView, Payload};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::MeasurementOverview;
use crate::state::AppState;

/// GET /:kind - measurements owned by the acting user
pub async fn list_get(
    State(state): State<AppState>,
    Extension(kind): Extension<MeasurementKind>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<MeasurementView>>, ApiError> {
    let records = state.measurement_service().list(kind, &user).await?;
    Ok(Json(records))
}

/// POST /:kind - create a measurement owned by the acting user
pub async fn create_post(
    State(state): State<AppState>,
    Extension(kind): Extension<MeasurementKind>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<Payload>, JsonRejection>,
) -> Result<(StatusCode, Json<MeasurementView>), ApiError> {
    let Json(body) = payload?;
    let created = state.measurement_service().create(kind, &user, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /:kind/:id - partial update, owner only
pub async fn update_put(
    State(state): State<AppState>,
    Extension(kind): Extension<MeasurementKind>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<Payload>, JsonRejection>,
) -> Result<Json<MeasurementView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let updated = state
        .measurement_service()
        .update(kind, &user, id, body)
        .await?;
    Ok(Json(updated))
}

/// DELETE /:kind/:id - owner only
pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<MeasurementKind>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state.measurement_service().delete(kind, &user, id).await?;
    Ok(Json(json!({ "message": "Measurement deleted successfully" })))
}

/// GET /measurements - all three collections in one response
pub async fn overview_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<MeasurementOverview>, ApiError> {
    let overview = state.measurement_service().overview(&user).await?;
    Ok(Json(overview))
}
