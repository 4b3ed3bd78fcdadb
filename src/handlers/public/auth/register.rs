// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use crate::error::ApiError;
use crate::services::{AuthResponse, ProfileRequest};
use crate::state::AppState;

/// POST /auth/register - Create an account and receive a JWT
///
/// Expected Input:
/// ```json
/// {
///   "email": "coach@example.com",
///   "password": "secret",
///   "name": "Coach",
///   "role": "professional",
///   "gender": "female",
///   "age": 41,
///   "country": "Chile"
/// }
/// ```
///
/// `role` defaults to `athlete`. Responds 201 with `{ token, user }`.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = payload?;
    let response = state.accounts().register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
