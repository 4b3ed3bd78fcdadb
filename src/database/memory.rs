use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Measurement, MeasurementKind, MeasurementPatch, NewMeasurement, NewUser, Role, User,
};
use super::{MeasurementStore, StoreError, UserStore};

/// In-process store used by the test suite and `DATABASE_URL=memory://`.
///
/// Mirrors the Postgres constraints: unique email, measurements cascade with
/// their owner, subject references are cleared when the subject is deleted.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    measurements: RwLock<Vec<Measurement>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(user.email));
        }
        let user = user.into_user();
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.role == role).cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::Sqlx(sqlx::Error::RowNotFound))?;

        stored.name = user.name.clone();
        stored.gender = user.gender.clone();
        stored.age = user.age;
        stored.country = user.country.clone();
        stored.sport = user.sport.clone();
        stored.phone = user.phone.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Ok(false);
        }

        let mut measurements = self.measurements.write().await;
        measurements.retain(|m| m.owner_id != id);
        for m in measurements.iter_mut().filter(|m| m.athlete_id == Some(id)) {
            m.athlete_id = None;
        }
        Ok(true)
    }

    async fn names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| (u.id, u.name.clone()))
            .collect())
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, StoreError> {
        let measurement = measurement.into_measurement();
        self.measurements.write().await.push(measurement.clone());
        Ok(measurement)
    }

    async fn find_by_owner(
        &self,
        kind: MeasurementKind,
        owner_id: Uuid,
    ) -> Result<Vec<Measurement>, StoreError> {
        let measurements = self.measurements.read().await;
        Ok(measurements
            .iter()
            .filter(|m| m.kind == kind && m.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        kind: MeasurementKind,
        id: Uuid,
    ) -> Result<Option<Measurement>, StoreError> {
        let measurements = self.measurements.read().await;
        Ok(measurements
            .iter()
            .find(|m| m.kind == kind && m.id == id)
            .cloned())
    }

    async fn update(
        &self,
        kind: MeasurementKind,
        id: Uuid,
        patch: MeasurementPatch,
    ) -> Result<Option<Measurement>, StoreError> {
        let mut measurements = self.measurements.write().await;
        Ok(measurements
            .iter_mut()
            .find(|m| m.kind == kind && m.id == id)
            .map(|m| {
                patch.apply(m);
                m.clone()
            }))
    }

    async fn delete(&self, kind: MeasurementKind, id: Uuid) -> Result<bool, StoreError> {
        let mut measurements = self.measurements.write().await;
        let before = measurements.len();
        measurements.retain(|m| !(m.kind == kind && m.id == id));
        Ok(measurements.len() < before)
    }
}
