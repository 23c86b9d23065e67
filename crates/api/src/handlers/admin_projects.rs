//! Administration of projects, their participants and consent forms.
//!
//! Mounted under `/admin/projects`. All handlers require the researcher or
//! admin role; deleting a project requires admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cohort_core::enrollment::{validate_project_settings, ProjectSettings};
use cohort_core::error::CoreError;
use cohort_core::status::SignupMode;
use cohort_core::types::DbId;
use cohort_db::models::consent::{ConsentForm, ConsentResponseView, UpsertConsentForm};
use cohort_db::models::flow::{LinkModule, ProjectModule};
use cohort_db::models::project::{CreateProject, Project, ProjectResponse, UpdateProject};
use cohort_db::models::project_user::ParticipantRow;
use cohort_db::repositories::{FlowRepo, ProjectRepo, ProjectUserRepo};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireResearcher};
use crate::participation::{existing_project, ConsentLedger, ProgressTracker, RemovalSummary};
use crate::response::{DataResponse, DeletedCount};
use crate::state::AppState;

/// Query string for consent-form writes. `override` only takes effect for
/// administrators.
#[derive(Debug, Default, Deserialize)]
pub struct OverrideQuery {
    #[serde(default, rename = "override")]
    pub override_lock: bool,
}

async fn project_response(pool: &PgPool, project: Project) -> AppResult<ProjectResponse> {
    let count = ProjectUserRepo::count_for_project(pool, project.id).await?;
    Ok(ProjectResponse::new(project, count)?)
}

fn check_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name must not be empty".into(),
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/projects
pub async fn list(
    State(state): State<AppState>,
    _user: RequireResearcher,
) -> AppResult<Json<DataResponse<Vec<ProjectResponse>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    let mut items = Vec::with_capacity(projects.len());
    for project in projects {
        items.push(project_response(&state.pool, project).await?);
    }
    Ok(Json(DataResponse::new(items)))
}

/// POST /api/v1/admin/projects
pub async fn create(
    State(state): State<AppState>,
    RequireResearcher(user): RequireResearcher,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectResponse>>)> {
    check_name(&input.name)?;
    validate_project_settings(&ProjectSettings {
        signup_mode: input.signup_mode.unwrap_or(SignupMode::Open),
        short_code: input.short_code.as_deref(),
        max_participants: input.max_participants.unwrap_or(0),
        min_age_years: input.min_age_years.unwrap_or(0),
    })?;

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, user_id = user.user_id, "Project created");

    let response = ProjectResponse::new(project, 0)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /api/v1/admin/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let project = existing_project(&state.pool, id).await?;
    Ok(Json(DataResponse::new(
        project_response(&state.pool, project).await?,
    )))
}

/// PUT /api/v1/admin/projects/{id}
///
/// Settings are validated as they will be after the update, merging the
/// submitted fields over the stored ones.
pub async fn update(
    State(state): State<AppState>,
    RequireResearcher(user): RequireResearcher,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    if let Some(name) = &input.name {
        check_name(name)?;
    }
    let existing = existing_project(&state.pool, id).await?;
    validate_project_settings(&ProjectSettings {
        signup_mode: match input.signup_mode {
            Some(mode) => mode,
            None => existing.signup_mode()?,
        },
        short_code: input
            .short_code
            .as_deref()
            .or(existing.short_code.as_deref()),
        max_participants: input.max_participants.unwrap_or(existing.max_participants),
        min_age_years: input.min_age_years.unwrap_or(existing.min_age_years),
    })?;

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    tracing::info!(project_id = id, user_id = user.user_id, "Project updated");

    Ok(Json(DataResponse::new(
        project_response(&state.pool, project).await?,
    )))
}

/// DELETE /api/v1/admin/projects/{id}
///
/// Removes the project with everything it owns. Admin only.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }
    tracing::info!(project_id = id, user_id = user.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/projects/{id}/participants
pub async fn list_participants(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ParticipantRow>>>> {
    existing_project(&state.pool, id).await?;
    let rows = ProjectUserRepo::list_participants(&state.pool, id).await?;
    Ok(Json(DataResponse::new(rows)))
}

/// DELETE /api/v1/admin/projects/{id}/participants/{user_id}
pub async fn remove_participant(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<RemovalSummary>>> {
    existing_project(&state.pool, id).await?;
    let summary = ProgressTracker::new(state.pool.clone())
        .remove_participant(id, user_id)
        .await?;
    Ok(Json(DataResponse::new(summary)))
}

/// DELETE /api/v1/admin/projects/{id}/participants/{user_id}/progress/{module_id}/{block_id}
pub async fn reset_participant_progress(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path((id, user_id, module_id, block_id)): Path<(DbId, DbId, DbId, DbId)>,
) -> AppResult<Json<DataResponse<DeletedCount>>> {
    let project = existing_project(&state.pool, id).await?;
    let deleted = ProgressTracker::new(state.pool.clone())
        .reset(&project, user_id, module_id, block_id)
        .await?;
    Ok(Json(DataResponse::new(DeletedCount { deleted })))
}

// ---------------------------------------------------------------------------
// Consent
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/projects/{id}/consent-responses
pub async fn list_consent_responses(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ConsentResponseView>>>> {
    existing_project(&state.pool, id).await?;
    let ledger = ConsentLedger::new(state.pool.clone(), state.config.clone());
    Ok(Json(DataResponse::new(ledger.responses(id).await?)))
}

/// PUT /api/v1/admin/projects/{id}/consent-form?override=
pub async fn save_consent_form(
    State(state): State<AppState>,
    user: RequireResearcher,
    Path(id): Path<DbId>,
    Query(query): Query<OverrideQuery>,
    Json(input): Json<UpsertConsentForm>,
) -> AppResult<Json<DataResponse<ConsentForm>>> {
    let ledger = ConsentLedger::new(state.pool.clone(), state.config.clone());
    let form = ledger
        .save_form(id, &input, query.override_lock, user.is_admin())
        .await?;
    Ok(Json(DataResponse::new(form)))
}

/// DELETE /api/v1/admin/projects/{id}/consent-form?override=
pub async fn delete_consent_form(
    State(state): State<AppState>,
    user: RequireResearcher,
    Path(id): Path<DbId>,
    Query(query): Query<OverrideQuery>,
) -> AppResult<StatusCode> {
    let ledger = ConsentLedger::new(state.pool.clone(), state.config.clone());
    ledger
        .delete_form(id, query.override_lock, user.is_admin())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Flow links
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/projects/{id}/modules
///
/// Link a module into the project, or change the sort order of an existing
/// link.
pub async fn link_module(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
    Json(input): Json<LinkModule>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectModule>>)> {
    existing_project(&state.pool, id).await?;
    let link = FlowRepo::link_module(&state.pool, id, &input).await?;
    tracing::info!(
        project_id = id,
        module_id = input.module_id,
        sort_order = input.sort_order,
        "Module linked"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(link))))
}

/// DELETE /api/v1/admin/projects/{id}/modules/{module_id}
pub async fn unlink_module(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path((id, module_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if !FlowRepo::unlink_module(&state.pool, id, module_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ProjectModule",
            id: module_id,
        }));
    }
    tracing::info!(project_id = id, module_id, "Module unlinked");
    Ok(StatusCode::NO_CONTENT)
}
