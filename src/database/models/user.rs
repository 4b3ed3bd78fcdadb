use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Professional,
    Athlete,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Professional => "professional",
            Role::Athlete => "athlete",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professional" => Ok(Role::Professional),
            "athlete" => Ok(Role::Athlete),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub gender: String,
    pub age: i32,
    pub country: String,
    pub sport: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_athlete(&self) -> bool {
        matches!(self.role, Role::Athlete)
    }

    /// Public view of the user, never carrying the password hash
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            gender: self.gender.clone(),
            age: self.age,
            country: self.country.clone(),
            sport: self.sport.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row shape of the `users` table; role is stored as text
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub gender: String,
    pub age: i32,
    pub country: String,
    pub sport: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role.parse()?,
            gender: row.gender,
            age: row.age,
            country: row.country,
            sport: row.sport,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub gender: String,
    pub age: i32,
    pub country: String,
    pub sport: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub gender: String,
    pub age: i32,
    pub country: String,
    pub sport: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            role: self.role,
            gender: self.gender,
            age: self.age,
            country: self.country,
            sport: self.sport,
            phone: self.phone,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile changes a professional may apply to an athlete.
///
/// Absent fields and empty strings leave the stored value alone. Any present
/// `age`, including 0, is applied; `validate` rejects negative ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthletePatch {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub country: Option<String>,
    pub sport: Option<String>,
    pub phone: Option<String>,
}

impl AthletePatch {
    /// Rejects values no stored profile may hold
    pub fn validate(&self) -> Result<(), String> {
        match self.age {
            Some(age) if age < 0 => Err("age cannot be negative".to_string()),
            _ => Ok(()),
        }
    }

    pub fn apply(&self, user: &mut User) {
        merge_text(&mut user.name, &self.name);
        merge_text(&mut user.gender, &self.gender);
        merge_text(&mut user.country, &self.country);
        merge_optional_text(&mut user.sport, &self.sport);
        merge_optional_text(&mut user.phone, &self.phone);
        if let Some(age) = self.age {
            user.age = age;
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn merge_text(target: &mut String, value: &Option<String>) {
    if let Some(v) = non_empty(value) {
        *target = v.to_string();
    }
}

fn merge_optional_text(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = non_empty(value) {
        *target = Some(v.to_string());
    }
}
