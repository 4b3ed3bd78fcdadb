pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use models::{Measurement, MeasurementKind, MeasurementPatch, NewMeasurement, NewUser, Role, User};

pub use manager::Database;
pub use memory::MemoryStore;
pub use repository::{PgMeasurementStore, PgUserStore};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for user identity records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user, failing with `Duplicate` when the email is taken
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;

    /// Persists profile fields of an existing user
    async fn update(&self, user: &User) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Display names for the given ids; unknown ids are skipped
    async fn names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, StoreError>;
}

/// Persistence for measurement records, always scoped by kind
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, StoreError>;

    async fn find_by_owner(
        &self,
        kind: MeasurementKind,
        owner_id: Uuid,
    ) -> Result<Vec<Measurement>, StoreError>;

    async fn find_by_id(
        &self,
        kind: MeasurementKind,
        id: Uuid,
    ) -> Result<Option<Measurement>, StoreError>;

    async fn update(
        &self,
        kind: MeasurementKind,
        id: Uuid,
        patch: MeasurementPatch,
    ) -> Result<Option<Measurement>, StoreError>;

    async fn delete(&self, kind: MeasurementKind, id: Uuid) -> Result<bool, StoreError>;
}
