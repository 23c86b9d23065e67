//! Repository for the `block_user_statuses` table.

use cohort_core::progress::ResetScope;
use cohort_core::status::{BlockStatus, StatusId};
use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::block_status::{BlockKey, BlockUserStatus};

const COLUMNS: &str =
    "id, user_id, project_id, module_id, block_id, status_id, created_at, updated_at";

pub struct BlockStatusRepo;

impl BlockStatusRepo {
    pub async fn find(
        pool: &PgPool,
        key: &BlockKey,
    ) -> Result<Option<BlockUserStatus>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM block_user_statuses
             WHERE user_id = $1 AND project_id = $2 AND module_id = $3 AND block_id = $4"
        );
        sqlx::query_as::<_, BlockUserStatus>(&query)
            .bind(key.user_id)
            .bind(key.project_id)
            .bind(key.module_id)
            .bind(key.block_id)
            .fetch_optional(pool)
            .await
    }

    /// Write a status unconditionally and refresh `updated_at`.
    pub async fn upsert(
        pool: &PgPool,
        key: &BlockKey,
        status: BlockStatus,
    ) -> Result<BlockUserStatus, sqlx::Error> {
        let query = format!(
            "INSERT INTO block_user_statuses (user_id, project_id, module_id, block_id, status_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, project_id, module_id, block_id) DO UPDATE SET
                status_id = EXCLUDED.status_id,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockUserStatus>(&query)
            .bind(key.user_id)
            .bind(key.project_id)
            .bind(key.module_id)
            .bind(key.block_id)
            .bind(StatusId::from(status))
            .fetch_one(pool)
            .await
    }

    /// Move a block to `started` only if it has no row or is still
    /// `not_started`. A concurrent write of a later status is never undone.
    ///
    /// Returns the row if this call changed it.
    pub async fn mark_started(
        pool: &PgPool,
        key: &BlockKey,
    ) -> Result<Option<BlockUserStatus>, sqlx::Error> {
        let query = format!(
            "INSERT INTO block_user_statuses (user_id, project_id, module_id, block_id, status_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, project_id, module_id, block_id) DO UPDATE SET
                status_id = EXCLUDED.status_id,
                updated_at = NOW()
             WHERE block_user_statuses.status_id = $6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockUserStatus>(&query)
            .bind(key.user_id)
            .bind(key.project_id)
            .bind(key.module_id)
            .bind(key.block_id)
            .bind(StatusId::from(BlockStatus::Started))
            .bind(StatusId::from(BlockStatus::NotStarted))
            .fetch_optional(pool)
            .await
    }

    /// All stored statuses of one participant in one project.
    pub async fn list_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<BlockUserStatus>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM block_user_statuses
             WHERE project_id = $1 AND user_id = $2
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, BlockUserStatus>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete the rows a reset scope selects. Returns the number deleted.
    pub async fn delete_scope(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        scope: ResetScope,
    ) -> Result<u64, sqlx::Error> {
        let result = match scope {
            ResetScope::Block {
                module_id,
                block_id,
            } => {
                sqlx::query(
                    "DELETE FROM block_user_statuses
                     WHERE project_id = $1 AND user_id = $2 AND module_id = $3 AND block_id = $4",
                )
                .bind(project_id)
                .bind(user_id)
                .bind(module_id)
                .bind(block_id)
                .execute(pool)
                .await?
            }
            ResetScope::Module { module_id } => {
                sqlx::query(
                    "DELETE FROM block_user_statuses
                     WHERE project_id = $1 AND user_id = $2 AND module_id = $3",
                )
                .bind(project_id)
                .bind(user_id)
                .bind(module_id)
                .execute(pool)
                .await?
            }
            ResetScope::Project => {
                sqlx::query(
                    "DELETE FROM block_user_statuses WHERE project_id = $1 AND user_id = $2",
                )
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }
}
