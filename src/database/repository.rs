use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::measurement::MeasurementRow;
use super::models::user::UserRow;
use super::models::{
    Measurement, MeasurementKind, MeasurementPatch, NewMeasurement, NewUser, Role, User,
};
use super::{MeasurementStore, StoreError, UserStore};

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, email, password_hash, name, role, gender, age, country, sport, phone, created_at, updated_at";

const MEASUREMENT_COLUMNS: &str =
    "id, kind, owner_id, athlete_id, recorded_at, payload, created_at, updated_at";

fn map_insert_error(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(what.to_string());
        }
    }
    StoreError::Sqlx(err)
}

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    User::try_from(row).map_err(StoreError::Corrupt)
}

fn measurement_from_row(row: MeasurementRow) -> Result<Measurement, StoreError> {
    Measurement::try_from(row).map_err(StoreError::Corrupt)
}

/// `users` table access
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user();
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {USER_COLUMNS}"
        );

        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(user.role.as_str())
            .bind(&user.gender)
            .bind(user.age)
            .bind(&user.country)
            .bind(&user.sport)
            .bind(&user.phone)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, &user.email))?;

        user_from_row(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(user_from_row)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(user_from_row)
            .transpose()
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET name = $2, gender = $3, age = $4, country = $5, sport = $6, \
             phone = $7, updated_at = $8 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.gender)
            .bind(user.age)
            .bind(&user.country)
            .bind(&user.sport)
            .bind(&user.phone)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        user_from_row(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

/// `measurements` table access
#[derive(Clone)]
pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, StoreError> {
        let m = measurement.into_measurement();
        let sql = format!(
            "INSERT INTO measurements ({MEASUREMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {MEASUREMENT_COLUMNS}"
        );

        let row: MeasurementRow = sqlx::query_as(&sql)
            .bind(m.id)
            .bind(m.kind.as_str())
            .bind(m.owner_id)
            .bind(m.athlete_id)
            .bind(m.recorded_at)
            .bind(Json(&m.payload))
            .bind(m.created_at)
            .bind(m.updated_at)
            .fetch_one(&self.pool)
            .await?;

        measurement_from_row(row)
    }

    async fn find_by_owner(
        &self,
        kind: MeasurementKind,
        owner_id: Uuid,
    ) -> Result<Vec<Measurement>, StoreError> {
        let sql = format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements \
             WHERE kind = $1 AND owner_id = $2 ORDER BY created_at"
        );
        sqlx::query_as::<_, MeasurementRow>(&sql)
            .bind(kind.as_str())
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(measurement_from_row)
            .collect()
    }

    async fn find_by_id(
        &self,
        kind: MeasurementKind,
        id: Uuid,
    ) -> Result<Option<Measurement>, StoreError> {
        let sql = format!("SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE kind = $1 AND id = $2");
        sqlx::query_as::<_, MeasurementRow>(&sql)
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(measurement_from_row)
            .transpose()
    }

    async fn update(
        &self,
        kind: MeasurementKind,
        id: Uuid,
        patch: MeasurementPatch,
    ) -> Result<Option<Measurement>, StoreError> {
        // Single statement so the merge is atomic per row
        let sql = format!(
            "UPDATE measurements SET \
                 payload = payload || $3, \
                 athlete_id = CASE WHEN $4 THEN $5 ELSE athlete_id END, \
                 recorded_at = COALESCE($6, recorded_at), \
                 updated_at = now() \
             WHERE kind = $1 AND id = $2 RETURNING {MEASUREMENT_COLUMNS}"
        );

        sqlx::query_as::<_, MeasurementRow>(&sql)
            .bind(kind.as_str())
            .bind(id)
            .bind(Json(&patch.payload))
            .bind(patch.athlete_id.is_some())
            .bind(patch.athlete_id.flatten())
            .bind(patch.recorded_at)
            .fetch_optional(&self.pool)
            .await?
            .map(measurement_from_row)
            .transpose()
    }

    async fn delete(&self, kind: MeasurementKind, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM measurements WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
