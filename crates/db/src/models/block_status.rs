//! Per-participant block progress rows.

use cohort_core::error::CoreError;
use cohort_core::flow::RecordedStatus;
use cohort_core::status::{BlockStatus, StatusId};
use cohort_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::decode;

/// A row from the `block_user_statuses` table.
#[derive(Debug, Clone, FromRow)]
pub struct BlockUserStatus {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: DbId,
    pub module_id: DbId,
    pub block_id: DbId,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BlockUserStatus {
    pub fn status(&self) -> Result<BlockStatus, CoreError> {
        decode(self.status_id, BlockStatus::from_id, "block status")
    }

    pub fn to_recorded(&self) -> Result<RecordedStatus, CoreError> {
        Ok(RecordedStatus {
            module_id: self.module_id,
            block_id: self.block_id,
            status: self.status()?,
            updated_at: self.updated_at,
        })
    }
}

/// Addresses one progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockKey {
    pub user_id: DbId,
    pub project_id: DbId,
    pub module_id: DbId,
    pub block_id: DbId,
}
