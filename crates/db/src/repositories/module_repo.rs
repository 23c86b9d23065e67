//! Repository for the `modules` table.

use cohort_core::status::StatusId;
use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::module::{CreateModule, Module, UpdateModule};

const COLUMNS: &str = "id, name, description, status_id, created_at, updated_at";

pub struct ModuleRepo;

impl ModuleRepo {
    /// Insert a new module. Status defaults to 1 (pending).
    pub async fn create(pool: &PgPool, input: &CreateModule) -> Result<Module, sqlx::Error> {
        let query = format!(
            "INSERT INTO modules (name, description, status_id)
             VALUES ($1, $2, COALESCE($3, 1))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.map(StatusId::from))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Module>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM modules WHERE id = $1");
        sqlx::query_as::<_, Module>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Module>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM modules ORDER BY id ASC");
        sqlx::query_as::<_, Module>(&query).fetch_all(pool).await
    }

    /// Update a module. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateModule,
    ) -> Result<Option<Module>, sqlx::Error> {
        let query = format!(
            "UPDATE modules SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status_id = COALESCE($4, status_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.map(StatusId::from))
            .fetch_optional(pool)
            .await
    }
}
