//! Consent recording: the enrollment gate, the append-only response ledger
//! and the project link, plus the consent-form edit lock.

use std::sync::Arc;

use chrono::Utc;
use cohort_core::consent::{
    check_form_mutation, validate_form_content, validate_submission, ConsentSubmission,
};
use cohort_core::enrollment::{evaluate, Candidate};
use cohort_core::error::{CoreError, DenialReason};
use cohort_core::status::{ConsentDecision, ProjectStatus};
use cohort_core::types::DbId;
use cohort_db::models::consent::{
    ConsentForm, ConsentResponseView, CreateConsentResponse, UpsertConsentForm,
};
use cohort_db::models::project::Project;
use cohort_db::models::project_user::LinkOutcome;
use cohort_db::repositories::{ConsentFormRepo, ConsentResponseRepo, ProjectRepo, ProjectUserRepo};
use serde::Serialize;
use sqlx::PgPool;

use super::identity::IdentityResolver;
use crate::auth::session::AuthResponse;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Result of a recorded consent submission.
#[derive(Debug, Serialize)]
pub struct ConsentOutcome {
    pub response: ConsentResponseView,
    /// The identity the submission was recorded for. Differs from the caller
    /// when a code project minted an anonymous identity.
    pub participant_id: DbId,
    /// Whether the identity is linked to the project after this call.
    pub linked: bool,
    pub participant_count: i64,
    /// Tokens for a newly created identity.
    pub session: Option<AuthResponse>,
}

pub struct ConsentLedger {
    pool: PgPool,
    config: Arc<ServerConfig>,
}

fn form_not_found(project_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ConsentForm",
        id: project_id,
    })
}

impl ConsentLedger {
    pub fn new(pool: PgPool, config: Arc<ServerConfig>) -> Self {
        Self { pool, config }
    }

    /// The consent form a participant reads before enrolling.
    ///
    /// A missing project, an inactive project and a project without a form
    /// all report the same not-found error.
    pub async fn form_for_participant(
        &self,
        project_id: DbId,
    ) -> AppResult<(Project, ConsentForm)> {
        let project = ProjectRepo::find_by_id(&self.pool, project_id)
            .await?
            .ok_or_else(|| form_not_found(project_id))?;
        if project.status()? != ProjectStatus::Active {
            return Err(form_not_found(project_id));
        }
        let form = ConsentFormRepo::find_by_project(&self.pool, project_id)
            .await?
            .ok_or_else(|| form_not_found(project_id))?;
        Ok((project, form))
    }

    /// Record a consent submission.
    ///
    /// The gate runs against a fresh read of the project, its live
    /// participant count and the candidate's existing link. Identities are
    /// only created after the gate passes. The response row is written before
    /// the capacity-guarded link; if the link loses a race for the last slot
    /// the response is removed again and the call is refused.
    pub async fn record(
        &self,
        caller: Option<&AuthUser>,
        project_id: DbId,
        submission: ConsentSubmission,
    ) -> AppResult<ConsentOutcome> {
        validate_submission(&submission)?;

        let (project, form) = self.form_for_participant(project_id).await?;
        let policy = project.enrollment_policy()?;
        let resolver = IdentityResolver::new(self.pool.clone(), Arc::clone(&self.config));

        // 1. Work out who is enrolling without writing anything.
        let plan = resolver
            .plan(caller, project.visibility_mode()?, submission.identity.clone())
            .await?;

        // 2. Gate.
        let already_linked = match plan.existing_id() {
            Some(user_id) => ProjectUserRepo::is_linked(&self.pool, project_id, user_id).await?,
            None => false,
        };
        let candidate = Candidate {
            already_linked,
            date_of_birth: plan.date_of_birth(),
        };
        let count = ProjectUserRepo::count_for_project(&self.pool, project_id).await?;
        let code = submission.code.as_deref();
        if let Err(reason) = evaluate(&policy, count, &candidate, code, Utc::now()) {
            tracing::info!(project_id, reason = reason.code(), "Enrollment refused");
            return Err(denial(reason, project_id));
        }

        // 3. Create the identity if needed.
        let participant = resolver.materialize(plan, project_id).await?;
        let participant_id = participant.user.id;

        // 4. Append the response.
        let connect = project.connect_participant_to_consent;
        let input = CreateConsentResponse {
            project_id,
            consent_form_id: Some(form.id),
            user_id: if connect { participant_id } else { 0 },
            decision: submission.decision,
            participant_comment: submission.participant_comment,
            first_name: submission.first_name,
            last_name: submission.last_name,
            contact_info: submission.contact_info,
        };
        let response = ConsentResponseRepo::create(&self.pool, &input).await?;

        // 5. Link, unless consent stays unconnected or was declined.
        let mut linked = false;
        if connect && submission.decision != ConsentDecision::Declined {
            match ProjectUserRepo::link_within_capacity(&self.pool, project_id, participant_id)
                .await?
            {
                LinkOutcome::Created | LinkOutcome::AlreadyLinked => linked = true,
                LinkOutcome::CapacityReached => {
                    ConsentResponseRepo::delete(&self.pool, response.id).await?;
                    tracing::warn!(
                        project_id,
                        user_id = participant_id,
                        response_id = response.id,
                        "Capacity reached while linking, consent response withdrawn"
                    );
                    return Err(AppError::Core(CoreError::Denied(
                        DenialReason::CapacityReached,
                    )));
                }
            }
        }

        let participant_count = ProjectUserRepo::count_for_project(&self.pool, project_id).await?;
        tracing::info!(
            project_id,
            user_id = participant_id,
            response_id = response.id,
            decision = submission.decision.name(),
            linked,
            participant_count,
            "Consent recorded"
        );

        Ok(ConsentOutcome {
            response: ConsentResponseView::new(response)?,
            participant_id,
            linked,
            participant_count,
            session: participant.session,
        })
    }

    /// Create or replace a project's consent form, subject to the edit lock.
    pub async fn save_form(
        &self,
        project_id: DbId,
        input: &UpsertConsentForm,
        override_requested: bool,
        caller_is_admin: bool,
    ) -> AppResult<ConsentForm> {
        validate_form_content(&input.content)?;
        self.check_unlocked(project_id, override_requested, caller_is_admin)
            .await?;

        let form = ConsentFormRepo::upsert(&self.pool, project_id, input).await?;
        tracing::info!(project_id, form_id = form.id, override_requested, "Consent form saved");
        Ok(form)
    }

    /// Delete a project's consent form, subject to the edit lock.
    pub async fn delete_form(
        &self,
        project_id: DbId,
        override_requested: bool,
        caller_is_admin: bool,
    ) -> AppResult<()> {
        self.check_unlocked(project_id, override_requested, caller_is_admin)
            .await?;

        if !ConsentFormRepo::delete_by_project(&self.pool, project_id).await? {
            return Err(form_not_found(project_id));
        }
        tracing::info!(project_id, override_requested, "Consent form deleted");
        Ok(())
    }

    /// Responses recorded for a project, oldest first.
    pub async fn responses(&self, project_id: DbId) -> AppResult<Vec<ConsentResponseView>> {
        let rows = ConsentResponseRepo::list_for_project(&self.pool, project_id).await?;
        rows.into_iter()
            .map(|r| ConsentResponseView::new(r).map_err(AppError::from))
            .collect()
    }

    async fn check_unlocked(
        &self,
        project_id: DbId,
        override_requested: bool,
        caller_is_admin: bool,
    ) -> AppResult<()> {
        super::existing_project(&self.pool, project_id).await?;
        let count = ProjectUserRepo::count_for_project(&self.pool, project_id).await?;
        check_form_mutation(count, override_requested, caller_is_admin).map_err(|e| {
            tracing::info!(project_id, participant_count = count, "Consent form is locked");
            AppError::from(e)
        })
    }
}

/// Project availability is reported as not-found on the participant side.
fn denial(reason: DenialReason, project_id: DbId) -> AppError {
    match reason {
        DenialReason::ProjectUnavailable => form_not_found(project_id),
        other => AppError::Core(CoreError::Denied(other)),
    }
}
