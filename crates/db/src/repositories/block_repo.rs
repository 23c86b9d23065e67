//! Repository for the `blocks` table.

use cohort_core::block_content::BlockContent;
use cohort_core::status::StatusId;
use cohort_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::block::{Block, CreateBlock, UpdateBlock};

const COLUMNS: &str = "id, name, kind_id, content, created_at, updated_at";

pub struct BlockRepo;

impl BlockRepo {
    /// Insert a block. The kind column follows the content's tag; content
    /// must already be validated.
    pub async fn create(pool: &PgPool, input: &CreateBlock) -> Result<Block, sqlx::Error> {
        let query = format!(
            "INSERT INTO blocks (name, kind_id, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Block>(&query)
            .bind(&input.name)
            .bind(StatusId::from(input.content.kind()))
            .bind(Json(&input.content))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Block>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blocks WHERE id = $1");
        sqlx::query_as::<_, Block>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update name and/or content. Replacing the content may change the kind.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBlock,
    ) -> Result<Option<Block>, sqlx::Error> {
        let query = format!(
            "UPDATE blocks SET
                name = COALESCE($2, name),
                kind_id = COALESCE($3, kind_id),
                content = COALESCE($4, content)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Block>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.content.as_ref().map(|c| StatusId::from(c.kind())))
            .bind(input.content.as_ref().map(Json::<&BlockContent>))
            .fetch_optional(pool)
            .await
    }

    /// Delete a block. Its flow links, statuses and submissions cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
