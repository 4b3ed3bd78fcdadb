use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::account_service::{create_user, ProfileRequest};
use super::{ServiceError, ServiceResult};
use crate::database::models::{AthletePatch, Role, User, UserView};
use crate::database::UserStore;

/// Athlete account management; access depends on the acting user's role
pub struct AthleteService {
    users: Arc<dyn UserStore>,
}

fn require_professional(actor: &User, message: &str) -> ServiceResult<()> {
    match actor.role {
        Role::Professional => Ok(()),
        Role::Athlete => Err(ServiceError::Forbidden(message.to_string())),
    }
}

impl AthleteService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Professionals see every athlete; athletes see only themselves
    pub async fn list(&self, actor: &User) -> ServiceResult<Vec<UserView>> {
        let athletes = match actor.role {
            Role::Professional => self.users.find_by_role(Role::Athlete).await?,
            Role::Athlete => self
                .users
                .find_by_id(actor.id)
                .await?
                .filter(User::is_athlete)
                .into_iter()
                .collect(),
        };

        Ok(athletes.iter().map(User::view).collect())
    }

    pub async fn create(&self, actor: &User, request: ProfileRequest) -> ServiceResult<UserView> {
        require_professional(actor, "Only professionals can create athletes")?;

        let athlete = create_user(self.users.as_ref(), &request, Role::Athlete).await?;
        info!("Professional {} created athlete {}", actor.id, athlete.id);
        Ok(athlete.view())
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        patch: AthletePatch,
    ) -> ServiceResult<UserView> {
        require_professional(actor, "Only professionals can update athletes")?;
        patch.validate().map_err(ServiceError::Validation)?;

        let mut athlete = self.load_athlete(id).await?;
        patch.apply(&mut athlete);

        let saved = self.users.update(&athlete).await?;
        Ok(saved.view())
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> ServiceResult<()> {
        require_professional(actor, "Only professionals can delete athletes")?;

        let athlete = self.load_athlete(id).await?;
        if !self.users.delete(athlete.id).await? {
            return Err(ServiceError::NotFound("Athlete not found".to_string()));
        }
        info!("Professional {} deleted athlete {}", actor.id, athlete.id);
        Ok(())
    }

    async fn load_athlete(&self, id: Uuid) -> ServiceResult<User> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Athlete not found".to_string()))?;

        if !user.is_athlete() {
            return Err(ServiceError::BadRequest("User is not an athlete".to_string()));
        }
        Ok(user)
    }
}
