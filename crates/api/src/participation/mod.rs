//! Participant-side services.
//!
//! Each service owns a pool handle and is built per request from
//! [`AppState`](crate::state::AppState). Handlers check project access with
//! [`participant_project`] before calling into them.
//!
//! - [`identity::IdentityResolver`] -- who is enrolling, minting identities as needed.
//! - [`consent::ConsentLedger`] -- the enrollment gate, consent responses and links.
//! - [`progress::ProgressTracker`] -- block states, submissions, resets, removal.
//! - [`flow::FlowAssembler`] -- ordered flow joined with one participant's progress.

pub mod consent;
pub mod flow;
pub mod identity;
pub mod progress;

use cohort_core::error::CoreError;
use cohort_core::types::DbId;
use cohort_db::models::project::Project;
use cohort_db::repositories::{ProjectRepo, ProjectUserRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

pub use consent::{ConsentLedger, ConsentOutcome};
pub use flow::FlowAssembler;
pub use identity::{IdentityPlan, IdentityResolver, ResolvedParticipant};
pub use progress::{ProgressReport, ProgressTracker, RemovalSummary, StatusReport};

/// Load a project for a participant-facing request.
///
/// Missing projects and projects hidden from participants look the same.
/// Projects that connect consent to participants additionally require an
/// existing link.
pub async fn participant_project(
    pool: &PgPool,
    project_id: DbId,
    user_id: DbId,
) -> AppResult<Project> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        })
    };

    let project = ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or_else(not_found)?;
    if !project.status()?.is_visible_to_participants() {
        return Err(not_found());
    }

    if project.connect_participant_to_consent
        && !ProjectUserRepo::is_linked(pool, project_id, user_id).await?
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not enrolled in this project".into(),
        )));
    }
    Ok(project)
}

/// Load a project for an administrative request.
pub async fn existing_project(pool: &PgPool, project_id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))
}
