//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::access::{AccessLevel, Permissions};
use cmms_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub job_title: String,
    pub access_level: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Parsed access level. Rows are constrained by a CHECK, so unknown
    /// values only appear if the constraint is dropped; they get the least
    /// privileged level.
    pub fn level(&self) -> AccessLevel {
        AccessLevel::from_str(&self.access_level).unwrap_or(AccessLevel::Mechanic)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub job_title: String,
    pub access_level: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub permissions: Permissions,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            job_title: user.job_title.clone(),
            access_level: user.access_level.clone(),
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
            permissions: Permissions::for_level(user.level()),
        }
    }
}

/// DTO for creating a new user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub job_title: String,
    pub access_level: String,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub access_level: Option<String>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub access_level: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}
