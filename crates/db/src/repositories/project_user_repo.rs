//! Repository for the `project_users` link table.

use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::project_user::{LinkOutcome, ParticipantRow};

pub struct ProjectUserRepo;

impl ProjectUserRepo {
    /// Link an identity unless the project is full.
    ///
    /// The project row is locked `FOR UPDATE` so concurrent enrollments into
    /// the same project serialize on the count. An existing link is reported
    /// as [`LinkOutcome::AlreadyLinked`] regardless of capacity.
    pub async fn link_within_capacity(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<LinkOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (max_participants,): (i32,) =
            sqlx::query_as("SELECT max_participants FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_one(&mut *tx)
                .await?;

        let (linked,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM project_users WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if linked {
            tx.commit().await?;
            return Ok(LinkOutcome::AlreadyLinked);
        }

        if max_participants > 0 {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM project_users WHERE project_id = $1")
                    .bind(project_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if count >= i64::from(max_participants) {
                tracing::debug!(
                    project_id,
                    user_id,
                    count,
                    max_participants,
                    "Link refused, project full"
                );
                tx.rollback().await?;
                return Ok(LinkOutcome::CapacityReached);
            }
        }

        sqlx::query("INSERT INTO project_users (project_id, user_id) VALUES ($1, $2)")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(LinkOutcome::Created)
    }

    pub async fn is_linked(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (linked,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM project_users WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(linked)
    }

    /// Live participant count of a project.
    pub async fn count_for_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_users WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Remove a link. Returns `true` if one existed.
    pub async fn unlink(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_users WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Participants of a project in link order, joined with their identities.
    pub async fn list_participants(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ParticipantRow>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRow>(
            "SELECT u.id AS user_id, u.username, u.email, u.first_name, u.last_name,
                    u.is_anonymous, pu.created_at AS linked_at
             FROM project_users pu
             JOIN users u ON u.id = pu.user_id
             WHERE pu.project_id = $1
             ORDER BY pu.created_at ASC, u.id ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
