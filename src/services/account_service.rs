use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{ServiceError, ServiceResult};
use crate::auth::{hash_password, verify_password, TokenService};
use crate::database::models::{NewUser, Role, User, UserView};
use crate::database::{StoreError, UserStore};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Profile payload accepted by registration and athlete creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub gender: String,
    pub age: Option<i32>,
    #[serde(default)]
    pub country: String,
    pub sport: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Emails are compared trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err("Invalid email format".to_string()),
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

fn required(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl ProfileRequest {
    /// Validates the payload and returns it with the password still in clear
    fn validated(&self, role: Role) -> Result<(NewUser, String), String> {
        let email = normalize_email(&self.email);
        validate_email_format(&email)?;

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ));
        }

        let age = match self.age {
            Some(age) if age >= 0 => age,
            Some(_) => return Err("age cannot be negative".to_string()),
            None => return Err("age is required".to_string()),
        };

        let user = NewUser {
            email,
            password_hash: String::new(),
            name: required(&self.name, "name")?,
            role,
            gender: required(&self.gender, "gender")?,
            age,
            country: required(&self.country, "country")?,
            sport: optional(&self.sport),
            phone: optional(&self.phone),
        };

        Ok((user, self.password.clone()))
    }
}

/// Creates a user with the given role, refusing duplicate emails
pub(crate) async fn create_user(
    users: &dyn UserStore,
    request: &ProfileRequest,
    role: Role,
) -> ServiceResult<User> {
    let (mut new_user, password) = request.validated(role).map_err(ServiceError::Validation)?;

    if users.find_by_email(&new_user.email).await?.is_some() {
        return Err(ServiceError::Conflict("User already exists".to_string()));
    }

    new_user.password_hash = hash_password(password).await?;

    // The unique index still guards against a concurrent registration
    users.create(new_user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => ServiceError::Conflict("User already exists".to_string()),
        other => other.into(),
    })
}

/// Registration, login and self lookup
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, request: ProfileRequest) -> ServiceResult<AuthResponse> {
        let role = request.role.unwrap_or(Role::Athlete);
        let user = create_user(self.users.as_ref(), &request, role).await?;
        info!("Registered {} user {}", user.role, user.id);

        self.respond(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let email = normalize_email(&request.email);

        // Same error for unknown email and wrong password
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Login failed: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!("Login failed: wrong password for user {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        self.respond(&user)
    }

    fn respond(&self, user: &User) -> ServiceResult<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue(user.id)?,
            user: user.view(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> (AccountService, Arc<MemoryStore>, Arc<TokenService>) {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new("test-secret", 24));
        (AccountService::new(store.clone(), tokens.clone()), store, tokens)
    }

    fn profile(email: &str) -> ProfileRequest {
        ProfileRequest {
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
            name: "Lea".to_string(),
            role: Some(Role::Professional),
            gender: "female".to_string(),
            age: Some(35),
            country: "France".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn email_format_validation() {
        assert!(validate_email_format("a@b.co").is_ok());
        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("no-at-sign.com").is_err());
        assert!(validate_email_format("a@b@c.com").is_err());
        assert!(validate_email_format("@b.com").is_err());
        assert!(validate_email_format("a@localhost").is_err());
    }

    #[tokio::test]
    async fn register_then_login_yields_same_subject() {
        let (service, _, tokens) = service();
        let registered = service.register(profile("Lea@Example.com ")).await.unwrap();
        assert_eq!(registered.user.email, "lea@example.com");
        assert_eq!(registered.user.role, Role::Professional);

        let logged_in = service
            .login(LoginRequest {
                email: "lea@example.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();

        let claims = tokens.verify(&logged_in.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let (service, store, _) = service();
        service.register(profile("dup@example.com")).await.unwrap();

        let second = service.register(profile("DUP@example.com")).await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn role_defaults_to_athlete() {
        let (service, _, _) = service();
        let mut request = profile("kid@example.com");
        request.role = None;

        let response = service.register(request).await.unwrap();
        assert_eq!(response.user.role, Role::Athlete);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (service, _, _) = service();
        service.register(profile("lea@example.com")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "lea@example.com".to_string(),
                password: "nope-nope".to_string(),
            })
            .await;
        let unknown_email = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn invalid_profiles_are_rejected() {
        let (service, store, _) = service();

        let mut short_password = profile("a@example.com");
        short_password.password = "123".to_string();
        assert!(matches!(
            service.register(short_password).await,
            Err(ServiceError::Validation(_))
        ));

        let mut negative_age = profile("b@example.com");
        negative_age.age = Some(-1);
        assert!(matches!(
            service.register(negative_age).await,
            Err(ServiceError::Validation(_))
        ));

        let mut no_name = profile("c@example.com");
        no_name.name = "  ".to_string();
        assert!(matches!(
            service.register(no_name).await,
            Err(ServiceError::Validation(_))
        ));

        assert_eq!(store.user_count().await, 0);
    }
}
