//! Repository for the `projects` table.

use cohort_core::status::StatusId;
use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, status_id, signup_mode_id, short_code, \
                       max_participants, min_age_years, visibility_mode_id, \
                       connect_participant_to_consent, completion_message, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Omitted settings fall back to the column defaults (pending, open,
    /// unlimited, no age check, full visibility, consent connected).
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description, status_id, signup_mode_id, short_code,
                                   max_participants, min_age_years, visibility_mode_id,
                                   connect_participant_to_consent, completion_message)
             VALUES ($1, $2, COALESCE($3, 1), COALESCE($4, 1), $5,
                     COALESCE($6, 0), COALESCE($7, 0), COALESCE($8, 3),
                     COALESCE($9, true), $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.map(StatusId::from))
            .bind(input.signup_mode.map(StatusId::from))
            .bind(&input.short_code)
            .bind(input.max_participants)
            .bind(input.min_age_years)
            .bind(input.visibility_mode.map(StatusId::from))
            .bind(input.connect_participant_to_consent)
            .bind(&input.completion_message)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status_id = COALESCE($4, status_id),
                signup_mode_id = COALESCE($5, signup_mode_id),
                short_code = COALESCE($6, short_code),
                max_participants = COALESCE($7, max_participants),
                min_age_years = COALESCE($8, min_age_years),
                visibility_mode_id = COALESCE($9, visibility_mode_id),
                connect_participant_to_consent = COALESCE($10, connect_participant_to_consent),
                completion_message = COALESCE($11, completion_message)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.map(StatusId::from))
            .bind(input.signup_mode.map(StatusId::from))
            .bind(&input.short_code)
            .bind(input.max_participants)
            .bind(input.min_age_years)
            .bind(input.visibility_mode.map(StatusId::from))
            .bind(input.connect_participant_to_consent)
            .bind(&input.completion_message)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project and everything it owns.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
