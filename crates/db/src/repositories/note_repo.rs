//! Repository for the `project_notes` table.

use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::note::{CreateProjectNote, ProjectNote};

const COLUMNS: &str =
    "id, project_id, user_id, module_id, block_id, body, created_at, updated_at";

pub struct NoteRepo;

impl NoteRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        input: &CreateProjectNote,
    ) -> Result<ProjectNote, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_notes (project_id, user_id, module_id, block_id, body)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectNote>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(input.module_id)
            .bind(input.block_id)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<ProjectNote>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_notes
             WHERE project_id = $1 AND user_id = $2
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProjectNote>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_notes WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
