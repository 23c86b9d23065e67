//! Project participation links.

use cohort_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `project_users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectUser {
    pub project_id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

/// A participant of a project, joined with their identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantRow {
    pub user_id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_anonymous: bool,
    pub linked_at: Timestamp,
}

/// Result of a capacity-guarded link write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
    CapacityReached,
}
