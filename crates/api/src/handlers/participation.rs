//! Participant-facing progress endpoints under `/projects/{project_id}`.
//!
//! Every handler loads the project through
//! [`participant_project`](crate::participation::participant_project) first.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cohort_core::error::CoreError;
use cohort_core::flow::FlowStep;
use cohort_core::form::Answers;
use cohort_core::types::DbId;
use cohort_db::models::note::{CreateProjectNote, ProjectNote};
use cohort_db::repositories::NoteRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::participation::progress::{OpenedBlock, SubmissionReport};
use crate::participation::{
    participant_project, FlowAssembler, ProgressReport, ProgressTracker, RemovalSummary,
    StatusReport,
};
use crate::response::{DataResponse, DeletedCount};
use crate::state::AppState;

/// Maximum length of a participant note.
const MAX_NOTE_LENGTH: usize = 10_000;

/// Request body for `PUT .../status`.
#[derive(Debug, Deserialize)]
pub struct StatusWrite {
    pub status: String,
}

/// Request body for `POST .../submission`.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub answers: Answers,
}

/// GET /api/v1/projects/{project_id}/flow
pub async fn flow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<FlowStep>>>> {
    participant_project(&state.pool, project_id, user.user_id).await?;
    let steps = FlowAssembler::new(state.pool.clone())
        .flow(project_id, user.user_id)
        .await?;
    Ok(Json(DataResponse::new(steps)))
}

/// GET /api/v1/projects/{project_id}/progress
pub async fn progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProgressReport>>> {
    let project = participant_project(&state.pool, project_id, user.user_id).await?;
    let report = ProgressTracker::new(state.pool.clone())
        .progress(&project, user.user_id)
        .await?;
    Ok(Json(DataResponse::new(report)))
}

/// GET /api/v1/projects/{project_id}/modules/{module_id}/blocks/{block_id}
pub async fn open_block(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, module_id, block_id)): Path<(DbId, DbId, DbId)>,
) -> AppResult<Json<DataResponse<OpenedBlock>>> {
    let project = participant_project(&state.pool, project_id, user.user_id).await?;
    let opened = ProgressTracker::new(state.pool.clone())
        .open_block(&project, user.user_id, module_id, block_id)
        .await?;
    Ok(Json(DataResponse::new(opened)))
}

/// PUT /api/v1/projects/{project_id}/modules/{module_id}/blocks/{block_id}/status
pub async fn write_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, module_id, block_id)): Path<(DbId, DbId, DbId)>,
    Json(input): Json<StatusWrite>,
) -> AppResult<Json<DataResponse<StatusReport>>> {
    let project = participant_project(&state.pool, project_id, user.user_id).await?;
    let report = ProgressTracker::new(state.pool.clone())
        .write_status(&project, user.user_id, module_id, block_id, &input.status)
        .await?;
    Ok(Json(DataResponse::new(report)))
}

/// POST /api/v1/projects/{project_id}/modules/{module_id}/blocks/{block_id}/submission
pub async fn submit_form(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, module_id, block_id)): Path<(DbId, DbId, DbId)>,
    Json(input): Json<SubmissionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubmissionReport>>)> {
    let project = participant_project(&state.pool, project_id, user.user_id).await?;
    let report = ProgressTracker::new(state.pool.clone())
        .submit_form(&project, user.user_id, module_id, block_id, input.answers)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(report))))
}

/// DELETE /api/v1/projects/{project_id}/progress/{module_id}/{block_id}
///
/// Reset the caller's own progress. Pass `0` for ids that are not given.
pub async fn reset_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, module_id, block_id)): Path<(DbId, DbId, DbId)>,
) -> AppResult<Json<DataResponse<DeletedCount>>> {
    let project = participant_project(&state.pool, project_id, user.user_id).await?;
    let deleted = ProgressTracker::new(state.pool.clone())
        .reset(&project, user.user_id, module_id, block_id)
        .await?;
    Ok(Json(DataResponse::new(DeletedCount { deleted })))
}

/// DELETE /api/v1/projects/{project_id}/participation
///
/// Withdraw from a project: the caller's consent responses, progress,
/// submissions, notes and link are all removed.
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RemovalSummary>>> {
    participant_project(&state.pool, project_id, user.user_id).await?;
    let summary = ProgressTracker::new(state.pool.clone())
        .remove_participant(project_id, user.user_id)
        .await?;
    Ok(Json(DataResponse::new(summary)))
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{project_id}/notes
pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectNote>>>> {
    participant_project(&state.pool, project_id, user.user_id).await?;
    let notes = NoteRepo::list_for_participant(&state.pool, project_id, user.user_id).await?;
    Ok(Json(DataResponse::new(notes)))
}

/// POST /api/v1/projects/{project_id}/notes
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateProjectNote>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectNote>>)> {
    participant_project(&state.pool, project_id, user.user_id).await?;

    if input.body.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Note body must not be empty".into(),
        )));
    }
    if input.body.chars().count() > MAX_NOTE_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Note body must be at most {MAX_NOTE_LENGTH} characters"
        ))));
    }
    if input.block_id.is_some() && input.module_id.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "A note pinned to a block also needs its module_id".into(),
        )));
    }

    let note = NoteRepo::create(&state.pool, project_id, user.user_id, &input).await?;
    tracing::info!(project_id, user_id = user.user_id, note_id = note.id, "Note created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(note))))
}
