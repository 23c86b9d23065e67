//! Module entity model and DTOs.

use cohort_core::error::CoreError;
use cohort_core::status::{ModuleStatus, StatusId};
use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decode;

/// A module row from the `modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Module {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Module {
    pub fn status(&self) -> Result<ModuleStatus, CoreError> {
        decode(self.status_id, ModuleStatus::from_id, "module status")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModule {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `pending` if omitted.
    pub status: Option<ModuleStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateModule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ModuleStatus>,
}
