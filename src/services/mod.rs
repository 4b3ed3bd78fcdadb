pub mod account_service;
pub mod athlete_service;
pub mod measurement_service;

pub use account_service::{AccountService, AuthResponse, LoginRequest, ProfileRequest};
pub use athlete_service::AthleteService;
pub use measurement_service::{MeasurementOverview, MeasurementService};

use crate::auth::{PasswordError, TokenError};
use crate::database::StoreError;

/// Rule violations and lower-level failures raised by the service layer
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
