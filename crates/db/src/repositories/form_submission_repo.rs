//! Repository for the `form_submissions` table.

use cohort_core::form::Answers;
use cohort_core::status::{BlockStatus, StatusId};
use cohort_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::block_status::{BlockKey, BlockUserStatus};
use crate::models::form_submission::FormSubmission;

const COLUMNS: &str = "id, user_id, project_id, module_id, block_id, answers, created_at";

pub struct FormSubmissionRepo;

impl FormSubmissionRepo {
    /// Store a validated submission and mark the block completed, in one
    /// transaction.
    pub async fn submit(
        pool: &PgPool,
        key: &BlockKey,
        answers: &Answers,
    ) -> Result<(FormSubmission, BlockUserStatus), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO form_submissions (user_id, project_id, module_id, block_id, answers)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let submission = sqlx::query_as::<_, FormSubmission>(&query)
            .bind(key.user_id)
            .bind(key.project_id)
            .bind(key.module_id)
            .bind(key.block_id)
            .bind(Json(answers))
            .fetch_one(&mut *tx)
            .await?;

        let status = sqlx::query_as::<_, BlockUserStatus>(
            "INSERT INTO block_user_statuses (user_id, project_id, module_id, block_id, status_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, project_id, module_id, block_id) DO UPDATE SET
                status_id = EXCLUDED.status_id,
                updated_at = NOW()
             RETURNING id, user_id, project_id, module_id, block_id, status_id,
                       created_at, updated_at",
        )
        .bind(key.user_id)
        .bind(key.project_id)
        .bind(key.module_id)
        .bind(key.block_id)
        .bind(StatusId::from(BlockStatus::Completed))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((submission, status))
    }

    /// Submissions for one block by one participant, newest first.
    pub async fn list_for_block(
        pool: &PgPool,
        key: &BlockKey,
    ) -> Result<Vec<FormSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_submissions
             WHERE user_id = $1 AND project_id = $2 AND module_id = $3 AND block_id = $4
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(key.user_id)
            .bind(key.project_id)
            .bind(key.module_id)
            .bind(key.block_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM form_submissions WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
