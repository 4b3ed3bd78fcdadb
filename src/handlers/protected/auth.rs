// handlers/protected/auth.rs - GET /auth/me handler

use axum::{Extension, Json};

use crate::database::models::UserView;
use crate::middleware::CurrentUser;

/// GET /auth/me - The authenticated user, without the password hash
pub async fn me_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserView> {
    Json(user.view())
}
