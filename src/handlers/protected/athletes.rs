// handlers/protected/athletes.rs - /athletes and /athletes/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use super::utils::parse_id;
use crate::database::models::{AthletePatch, UserView};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::ProfileRequest;
use crate::state::AppState;

/// GET /athletes - every athlete for professionals, only self for athletes
pub async fn list_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(Json(state.athletes().list(&user).await?))
}

/// POST /athletes - professionals only; role is always athlete
pub async fn create_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let Json(request) = payload?;
    let athlete = state.athletes().create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(athlete)))
}

/// PUT /athletes/:id - professionals only; empty fields keep stored values
pub async fn update_put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<AthletePatch>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.athletes().update(&user, id, patch).await?))
}

/// DELETE /athletes/:id - professionals only
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state.athletes().delete(&user, id).await?;
    Ok(Json(json!({ "message": "Athlete deleted successfully" })))
}
