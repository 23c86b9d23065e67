use cohort_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `form_submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormSubmission {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: DbId,
    pub module_id: DbId,
    pub block_id: DbId,
    pub answers: serde_json::Value,
    pub created_at: Timestamp,
}
