//! Flow link models: which modules a project contains and which blocks a
//! module contains, each with a sort order.

use cohort_core::error::CoreError;
use cohort_core::flow::FlowEntry;
use cohort_core::status::{BlockKind, ModuleStatus, StatusId};
use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decode;

/// A row from the `project_modules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectModule {
    pub id: DbId,
    pub project_id: DbId,
    pub module_id: DbId,
    pub sort_order: i32,
    pub created_at: Timestamp,
}

/// A row from the `module_blocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleBlock {
    pub id: DbId,
    pub module_id: DbId,
    pub block_id: DbId,
    pub sort_order: i32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkModule {
    pub module_id: DbId,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkBlock {
    pub block_id: DbId,
    #[serde(default)]
    pub sort_order: i32,
}

/// One (module, block) pair of a project's flow, joined across both link
/// tables.
#[derive(Debug, Clone, FromRow)]
pub struct FlowRow {
    pub module_id: DbId,
    pub module_name: String,
    pub module_status_id: StatusId,
    pub module_order: i32,
    pub block_id: DbId,
    pub block_name: String,
    pub block_kind_id: StatusId,
    pub block_order: i32,
}

impl FlowRow {
    pub fn block_kind(&self) -> Result<BlockKind, CoreError> {
        decode(self.block_kind_id, BlockKind::from_id, "block kind")
    }

    pub fn into_entry(self) -> Result<FlowEntry, CoreError> {
        Ok(FlowEntry {
            module_status: decode(self.module_status_id, ModuleStatus::from_id, "module status")?,
            block_kind: self.block_kind()?,
            module_id: self.module_id,
            module_name: self.module_name,
            module_order: self.module_order,
            block_id: self.block_id,
            block_name: self.block_name,
            block_order: self.block_order,
        })
    }
}
