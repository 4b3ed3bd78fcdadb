use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path id, answering 400 instead of axum's plain-text rejection
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", raw)))
}
