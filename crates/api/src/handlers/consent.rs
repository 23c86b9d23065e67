//! Participant-facing consent endpoints under `/projects/{project_id}/consent`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cohort_core::consent::ConsentSubmission;
use cohort_core::status::{SignupMode, VisibilityMode};
use cohort_core::types::DbId;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::participation::{ConsentLedger, ConsentOutcome};
use crate::response::DataResponse;
use crate::state::AppState;

/// What a prospective participant sees before consenting.
#[derive(Debug, Serialize)]
pub struct ConsentFormView {
    pub project_id: DbId,
    pub project_name: String,
    pub description: Option<String>,
    pub signup_mode: SignupMode,
    pub visibility_mode: VisibilityMode,
    /// Whether a signup code must accompany the submission.
    pub requires_code: bool,
    pub content: String,
    pub contact_info: Option<String>,
    pub institution: Option<String>,
}

/// GET /api/v1/projects/{project_id}/consent
pub async fn get_form(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ConsentFormView>>> {
    let ledger = ConsentLedger::new(state.pool.clone(), state.config.clone());
    let (project, form) = ledger.form_for_participant(project_id).await?;
    let signup_mode = project.signup_mode()?;

    Ok(Json(DataResponse::new(ConsentFormView {
        project_id: project.id,
        visibility_mode: project.visibility_mode()?,
        project_name: project.name,
        description: project.description,
        requires_code: signup_mode == SignupMode::WithCode,
        signup_mode,
        content: form.content,
        contact_info: form.contact_info,
        institution: form.institution,
    })))
}

/// POST /api/v1/projects/{project_id}/consent
///
/// Works with or without a bearer token. Without one, the body must carry the
/// identity fields the project's visibility mode needs.
pub async fn submit(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    caller: Option<AuthUser>,
    Json(input): Json<ConsentSubmission>,
) -> AppResult<(StatusCode, Json<DataResponse<ConsentOutcome>>)> {
    let ledger = ConsentLedger::new(state.pool.clone(), state.config.clone());
    let outcome = ledger.record(caller.as_ref(), project_id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(outcome))))
}
