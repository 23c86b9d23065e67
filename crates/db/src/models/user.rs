//! Identity model and DTOs.

use cohort_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
///
/// Anonymous identities have a participant code as `username` and no name or
/// email.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub pronouns: Option<String>,
    pub date_of_birth: Option<String>,
    pub is_anonymous: bool,
    pub password_hash: String,
    pub role_id: DbId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe identity representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_anonymous: bool,
    /// Resolved role name (e.g. `"admin"`, `"participant"`).
    pub role: String,
}

impl UserResponse {
    pub fn new(user: &User, role: String) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_anonymous: user.is_anonymous,
            role,
        }
    }
}

/// DTO for inserting an identity.
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub pronouns: Option<String>,
    pub date_of_birth: Option<String>,
    pub is_anonymous: bool,
    pub password_hash: String,
    pub role_id: DbId,
}
