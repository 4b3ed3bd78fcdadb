use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::models::{
    AthleteRef, Measurement, MeasurementInput, MeasurementKind, MeasurementView, Payload, User,
};
use crate::database::{MeasurementStore, UserStore};

/// All three collections of the acting user
#[derive(Debug, Serialize)]
pub struct MeasurementOverview {
    pub anthropometric: Vec<MeasurementView>,
    pub performance: Vec<MeasurementView>,
    pub health: Vec<MeasurementView>,
}

/// Owner-scoped CRUD over every measurement kind
pub struct MeasurementService {
    users: Arc<dyn UserStore>,
    measurements: Arc<dyn MeasurementStore>,
}

impl MeasurementService {
    pub fn new(users: Arc<dyn UserStore>, measurements: Arc<dyn MeasurementStore>) -> Self {
        Self { users, measurements }
    }

    pub async fn list(&self, kind: MeasurementKind, actor: &User) -> ServiceResult<Vec<MeasurementView>> {
        let records = self.measurements.find_by_owner(kind, actor.id).await?;
        self.populate(records).await
    }

    /// The owner is always the acting user, whatever the body says
    pub async fn create(
        &self,
        kind: MeasurementKind,
        actor: &User,
        body: Payload,
    ) -> ServiceResult<MeasurementView> {
        let input = parse(kind, body)?;
        if let Some(Some(athlete_id)) = input.athlete_id {
            self.ensure_subject_exists(athlete_id).await?;
        }

        let created = self.measurements.create(input.into_new(kind, actor.id)).await?;
        debug!("User {} created {} measurement {}", actor.id, kind, created.id);
        self.populate_one(created).await
    }

    pub async fn update(
        &self,
        kind: MeasurementKind,
        actor: &User,
        id: Uuid,
        body: Payload,
    ) -> ServiceResult<MeasurementView> {
        self.load_owned(kind, actor, id, "Not authorized to update this measurement")
            .await?;

        let input = parse(kind, body)?;
        if let Some(Some(athlete_id)) = input.athlete_id {
            self.ensure_subject_exists(athlete_id).await?;
        }

        let updated = self
            .measurements
            .update(kind, id, input.into_patch())
            .await?
            .ok_or_else(not_found)?;
        self.populate_one(updated).await
    }

    pub async fn delete(&self, kind: MeasurementKind, actor: &User, id: Uuid) -> ServiceResult<()> {
        self.load_owned(kind, actor, id, "Not authorized to delete this measurement")
            .await?;

        if !self.measurements.delete(kind, id).await? {
            return Err(not_found());
        }
        debug!("User {} deleted {} measurement {}", actor.id, kind, id);
        Ok(())
    }

    /// Fetches the three collections concurrently; any failure fails the whole read
    pub async fn overview(&self, actor: &User) -> ServiceResult<MeasurementOverview> {
        let (anthropometric, performance, health) = tokio::try_join!(
            self.list(MeasurementKind::Anthropometric, actor),
            self.list(MeasurementKind::Performance, actor),
            self.list(MeasurementKind::Health, actor),
        )?;

        Ok(MeasurementOverview {
            anthropometric,
            performance,
            health,
        })
    }

    async fn load_owned(
        &self,
        kind: MeasurementKind,
        actor: &User,
        id: Uuid,
        denied: &str,
    ) -> ServiceResult<Measurement> {
        let measurement = self
            .measurements
            .find_by_id(kind, id)
            .await?
            .ok_or_else(not_found)?;

        if measurement.owner_id != actor.id {
            warn!(
                "User {} denied access to {} measurement {} owned by {}",
                actor.id, kind, id, measurement.owner_id
            );
            return Err(ServiceError::Forbidden(denied.to_string()));
        }
        Ok(measurement)
    }

    async fn ensure_subject_exists(&self, athlete_id: Uuid) -> ServiceResult<()> {
        match self.users.find_by_id(athlete_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::BadRequest(
                "Referenced athlete not found".to_string(),
            )),
        }
    }

    async fn populate(&self, records: Vec<Measurement>) -> ServiceResult<Vec<MeasurementView>> {
        let mut ids: Vec<Uuid> = records.iter().filter_map(|m| m.athlete_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let names = self.users.names(&ids).await?;

        Ok(records
            .into_iter()
            .map(|m| {
                let athlete = m.athlete_id.and_then(|id| {
                    names.get(&id).map(|name| AthleteRef {
                        id,
                        name: name.clone(),
                    })
                });
                MeasurementView::new(m, athlete)
            })
            .collect())
    }

    async fn populate_one(&self, record: Measurement) -> ServiceResult<MeasurementView> {
        self.populate(vec![record])
            .await?
            .pop()
            .ok_or_else(not_found)
    }
}

fn parse(kind: MeasurementKind, body: Payload) -> ServiceResult<MeasurementInput> {
    MeasurementInput::parse(kind, body).map_err(|e| ServiceError::Validation(e.to_string()))
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Measurement not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewUser, Role};
    use crate::database::MemoryStore;
    use serde_json::{json, Value};

    async fn seed(store: &MemoryStore, email: &str, name: &str, role: Role) -> User {
        UserStore::create(
            store,
            NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                name: name.to_string(),
                role,
                gender: "female".to_string(),
                age: 28,
                country: "Norway".to_string(),
                sport: None,
                phone: None,
            },
        )
        .await
        .unwrap()
    }

    fn body(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn service(store: &Arc<MemoryStore>) -> MeasurementService {
        MeasurementService::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn create_forces_owner_and_populates_subject() {
        let store = Arc::new(MemoryStore::new());
        let pro = seed(&store, "pro@x.io", "Coach", Role::Professional).await;
        let athlete = seed(&store, "a@x.io", "Ingrid", Role::Athlete).await;
        let service = service(&store);

        let view = service
            .create(
                MeasurementKind::Anthropometric,
                &pro,
                body(json!({
                    "ownerId": athlete.id,
                    "userId": athlete.id,
                    "athleteId": athlete.id,
                    "weight": 61.2,
                    "height": 170
                })),
            )
            .await
            .unwrap();

        assert_eq!(view.owner_id, pro.id);
        assert_eq!(
            view.athlete_id,
            Some(AthleteRef {
                id: athlete.id,
                name: "Ingrid".to_string()
            })
        );
        assert!(!view.payload.contains_key("userId"));
    }

    #[tokio::test]
    async fn list_is_owner_scoped() {
        let store = Arc::new(MemoryStore::new());
        let a = seed(&store, "a@x.io", "A", Role::Professional).await;
        let b = seed(&store, "b@x.io", "B", Role::Professional).await;
        let service = service(&store);

        service
            .create(MeasurementKind::Health, &a, body(json!({ "heartRate": 60 })))
            .await
            .unwrap();
        service
            .create(MeasurementKind::Health, &b, body(json!({ "heartRate": 75 })))
            .await
            .unwrap();

        let mine = service.list(MeasurementKind::Health, &a).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].payload["heartRate"], json!(60));
        assert!(service
            .list(MeasurementKind::Performance, &a)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn non_owner_cannot_mutate() {
        let store = Arc::new(MemoryStore::new());
        let owner = seed(&store, "o@x.io", "Owner", Role::Professional).await;
        let intruder = seed(&store, "i@x.io", "Intruder", Role::Professional).await;
        let service = service(&store);

        let created = service
            .create(MeasurementKind::Performance, &owner, body(json!({ "sprintTime": 11.2 })))
            .await
            .unwrap();

        let update = service
            .update(
                MeasurementKind::Performance,
                &intruder,
                created.id,
                body(json!({ "sprintTime": 9.0 })),
            )
            .await;
        assert!(matches!(update, Err(ServiceError::Forbidden(_))));

        let delete = service
            .delete(MeasurementKind::Performance, &intruder, created.id)
            .await;
        assert!(matches!(delete, Err(ServiceError::Forbidden(_))));

        let unchanged = service.list(MeasurementKind::Performance, &owner).await.unwrap();
        assert_eq!(unchanged.len(), 1);
        assert_eq!(unchanged[0].payload["sprintTime"], json!(11.2));
    }

    #[tokio::test]
    async fn owner_update_merges_fields() {
        let store = Arc::new(MemoryStore::new());
        let owner = seed(&store, "o@x.io", "Owner", Role::Athlete).await;
        let service = service(&store);

        let created = service
            .create(
                MeasurementKind::Anthropometric,
                &owner,
                body(json!({ "weight": 80, "height": 182 })),
            )
            .await
            .unwrap();

        let updated = service
            .update(
                MeasurementKind::Anthropometric,
                &owner,
                created.id,
                body(json!({ "weight": 78.5, "ownerId": Uuid::new_v4() })),
            )
            .await
            .unwrap();

        assert_eq!(updated.payload["weight"], json!(78.5));
        assert_eq!(updated.payload["height"], json!(182));
        assert_eq!(updated.owner_id, owner.id);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let owner = seed(&store, "o@x.io", "Owner", Role::Athlete).await;
        let service = service(&store);

        let result = service
            .delete(MeasurementKind::Health, &owner, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let owner = seed(&store, "o@x.io", "Owner", Role::Professional).await;
        let service = service(&store);

        let result = service
            .create(
                MeasurementKind::Health,
                &owner,
                body(json!({ "athleteId": Uuid::new_v4() })),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    #[tokio::test]
    async fn overview_groups_by_kind() {
        let store = Arc::new(MemoryStore::new());
        let owner = seed(&store, "o@x.io", "Owner", Role::Professional).await;
        let service = service(&store);

        service
            .create(MeasurementKind::Anthropometric, &owner, body(json!({ "weight": 70 })))
            .await
            .unwrap();
        service
            .create(MeasurementKind::Health, &owner, body(json!({ "heartRate": 55 })))
            .await
            .unwrap();
        service
            .create(MeasurementKind::Health, &owner, body(json!({ "heartRate": 58 })))
            .await
            .unwrap();

        let overview = service.overview(&owner).await.unwrap();
        assert_eq!(overview.anthropometric.len(), 1);
        assert!(overview.performance.is_empty());
        assert_eq!(overview.health.len(), 2);
    }
}
