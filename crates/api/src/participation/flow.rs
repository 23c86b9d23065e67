use chrono::Utc;
use cohort_core::flow::{assemble, FlowEntry, FlowStep, RecordedStatus};
use cohort_core::types::DbId;
use cohort_db::models::block_status::BlockUserStatus;
use cohort_db::models::flow::FlowRow;
use cohort_db::repositories::{BlockStatusRepo, FlowRepo};
use sqlx::PgPool;

use crate::error::AppResult;

/// Reads a project's flow for one participant. Never writes.
pub struct FlowAssembler {
    pool: PgPool,
}

impl FlowAssembler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn flow(&self, project_id: DbId, user_id: DbId) -> AppResult<Vec<FlowStep>> {
        let entries = FlowRepo::list_for_project(&self.pool, project_id)
            .await?
            .into_iter()
            .map(FlowRow::into_entry)
            .collect::<Result<Vec<FlowEntry>, _>>()?;

        let recorded = BlockStatusRepo::list_for_participant(&self.pool, project_id, user_id)
            .await?
            .iter()
            .map(BlockUserStatus::to_recorded)
            .collect::<Result<Vec<RecordedStatus>, _>>()?;

        let steps = assemble(entries, &recorded, Utc::now());
        tracing::debug!(project_id, user_id, steps = steps.len(), "Flow assembled");
        Ok(steps)
    }
}
