//! Participant notes within a project.

use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `project_notes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectNote {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub module_id: Option<DbId>,
    pub block_id: Option<DbId>,
    pub body: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for a new note, optionally pinned to a module or block.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectNote {
    pub module_id: Option<DbId>,
    pub block_id: Option<DbId>,
    pub body: String,
}
