// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::ApiError;
use crate::services::{AuthResponse, LoginRequest};
use crate::state::AppState;

/// POST /auth/login - Authenticate with email and password and receive a JWT
///
/// Expected Input:
/// ```json
/// { "email": "coach@example.com", "password": "secret" }
/// ```
///
/// Unknown email and wrong password both answer 400 "Invalid credentials".
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.accounts().login(request).await?;
    Ok(Json(response))
}
