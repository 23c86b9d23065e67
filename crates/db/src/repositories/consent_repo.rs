//! Repositories for `consent_forms` and the append-only `consent_responses`.

use cohort_core::status::StatusId;
use cohort_core::types::DbId;
use sqlx::PgPool;

use crate::models::consent::{
    ConsentForm, ConsentResponse, CreateConsentResponse, UpsertConsentForm,
};

const FORM_COLUMNS: &str =
    "id, project_id, content, contact_info, institution, created_at, updated_at";

const RESPONSE_COLUMNS: &str = "id, project_id, consent_form_id, user_id, decision_id, \
                                participant_comment, researcher_comment, first_name, last_name, \
                                contact_info, created_at";

pub struct ConsentFormRepo;

impl ConsentFormRepo {
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<ConsentForm>, sqlx::Error> {
        let query = format!("SELECT {FORM_COLUMNS} FROM consent_forms WHERE project_id = $1");
        sqlx::query_as::<_, ConsentForm>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or replace the project's consent form.
    ///
    /// Callers must check the participant lock first.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        input: &UpsertConsentForm,
    ) -> Result<ConsentForm, sqlx::Error> {
        let query = format!(
            "INSERT INTO consent_forms (project_id, content, contact_info, institution)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (project_id) DO UPDATE SET
                content = EXCLUDED.content,
                contact_info = EXCLUDED.contact_info,
                institution = EXCLUDED.institution
             RETURNING {FORM_COLUMNS}"
        );
        sqlx::query_as::<_, ConsentForm>(&query)
            .bind(project_id)
            .bind(&input.content)
            .bind(&input.contact_info)
            .bind(&input.institution)
            .fetch_one(pool)
            .await
    }

    pub async fn delete_by_project(pool: &PgPool, project_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM consent_forms WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct ConsentResponseRepo;

impl ConsentResponseRepo {
    /// Append a response. Responses are never updated.
    pub async fn create(
        pool: &PgPool,
        input: &CreateConsentResponse,
    ) -> Result<ConsentResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO consent_responses
                 (project_id, consent_form_id, user_id, decision_id,
                  participant_comment, first_name, last_name, contact_info)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {RESPONSE_COLUMNS}"
        );
        sqlx::query_as::<_, ConsentResponse>(&query)
            .bind(input.project_id)
            .bind(input.consent_form_id)
            .bind(input.user_id)
            .bind(StatusId::from(input.decision))
            .bind(&input.participant_comment)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.contact_info)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ConsentResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM consent_responses
             WHERE project_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, ConsentResponse>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<ConsentResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM consent_responses
             WHERE project_id = $1 AND user_id = $2 ORDER BY id ASC"
        );
        sqlx::query_as::<_, ConsentResponse>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Remove a single response. Used to undo a response whose link write
    /// lost the capacity race.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM consent_responses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_participant(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM consent_responses WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
