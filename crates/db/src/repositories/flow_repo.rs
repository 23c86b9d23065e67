//! Repository for the flow link tables (`project_modules`, `module_blocks`).

use cohort_core::status::{ModuleStatus, StatusId};
use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::flow::{FlowRow, LinkBlock, LinkModule, ModuleBlock, ProjectModule};

const FLOW_SELECT: &str = "SELECT m.id AS module_id, m.name AS module_name, \
                                  m.status_id AS module_status_id, pm.sort_order AS module_order, \
                                  b.id AS block_id, b.name AS block_name, \
                                  b.kind_id AS block_kind_id, mb.sort_order AS block_order \
                           FROM project_modules pm \
                           JOIN modules m ON m.id = pm.module_id \
                           JOIN module_blocks mb ON mb.module_id = m.id \
                           JOIN blocks b ON b.id = mb.block_id";

pub struct FlowRepo;

impl FlowRepo {
    /// Link a module into a project, or move an existing link to a new sort
    /// order. The link id (tie-breaker) is kept on update.
    pub async fn link_module(
        pool: &PgPool,
        project_id: DbId,
        input: &LinkModule,
    ) -> Result<ProjectModule, sqlx::Error> {
        sqlx::query_as::<_, ProjectModule>(
            "INSERT INTO project_modules (project_id, module_id, sort_order)
             VALUES ($1, $2, $3)
             ON CONFLICT (project_id, module_id) DO UPDATE SET sort_order = EXCLUDED.sort_order
             RETURNING id, project_id, module_id, sort_order, created_at",
        )
        .bind(project_id)
        .bind(input.module_id)
        .bind(input.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn unlink_module(
        pool: &PgPool,
        project_id: DbId,
        module_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_modules WHERE project_id = $1 AND module_id = $2")
                .bind(project_id)
                .bind(module_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Link a block into a module, or move an existing link.
    pub async fn link_block(
        pool: &PgPool,
        module_id: DbId,
        input: &LinkBlock,
    ) -> Result<ModuleBlock, sqlx::Error> {
        sqlx::query_as::<_, ModuleBlock>(
            "INSERT INTO module_blocks (module_id, block_id, sort_order)
             VALUES ($1, $2, $3)
             ON CONFLICT (module_id, block_id) DO UPDATE SET sort_order = EXCLUDED.sort_order
             RETURNING id, module_id, block_id, sort_order, created_at",
        )
        .bind(module_id)
        .bind(input.block_id)
        .bind(input.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn unlink_block(
        pool: &PgPool,
        module_id: DbId,
        block_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM module_blocks WHERE module_id = $1 AND block_id = $2")
            .bind(module_id)
            .bind(block_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All (module, block) pairs of a project in link order, inactive modules
    /// included. Ordering and filtering for participants happens in
    /// `cohort_core::flow::assemble`.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<FlowRow>, sqlx::Error> {
        let query = format!(
            "{FLOW_SELECT}
             WHERE pm.project_id = $1
             ORDER BY pm.sort_order, pm.id, mb.sort_order, mb.id"
        );
        sqlx::query_as::<_, FlowRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find one block of a project's active flow.
    pub async fn find_active_step(
        pool: &PgPool,
        project_id: DbId,
        module_id: DbId,
        block_id: DbId,
    ) -> Result<Option<FlowRow>, sqlx::Error> {
        let query = format!(
            "{FLOW_SELECT}
             WHERE pm.project_id = $1 AND m.id = $2 AND b.id = $3 AND m.status_id = $4"
        );
        sqlx::query_as::<_, FlowRow>(&query)
            .bind(project_id)
            .bind(module_id)
            .bind(block_id)
            .bind(StatusId::from(ModuleStatus::Active))
            .fetch_optional(pool)
            .await
    }

    /// Whether a module is an active part of a project's flow.
    pub async fn has_active_module(
        pool: &PgPool,
        project_id: DbId,
        module_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM project_modules pm
                JOIN modules m ON m.id = pm.module_id
                WHERE pm.project_id = $1 AND pm.module_id = $2 AND m.status_id = $3
             )",
        )
        .bind(project_id)
        .bind(module_id)
        .bind(StatusId::from(ModuleStatus::Active))
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}
