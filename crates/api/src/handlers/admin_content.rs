//! Administration of modules and blocks, and of which blocks a module holds.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cohort_core::block_content::ValidateContent;
use cohort_core::error::CoreError;
use cohort_core::types::DbId;
use cohort_db::models::block::{BlockResponse, CreateBlock, UpdateBlock};
use cohort_db::models::flow::{LinkBlock, ModuleBlock};
use cohort_db::models::module::{CreateModule, Module, UpdateModule};
use cohort_db::repositories::{BlockRepo, FlowRepo, ModuleRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireResearcher;
use crate::response::DataResponse;
use crate::state::AppState;

fn check_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name must not be empty".into(),
        )));
    }
    Ok(())
}

fn module_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Module",
        id,
    })
}

fn block_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Block",
        id,
    })
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/modules
pub async fn list_modules(
    State(state): State<AppState>,
    _user: RequireResearcher,
) -> AppResult<Json<DataResponse<Vec<Module>>>> {
    let modules = ModuleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(modules)))
}

/// POST /api/v1/admin/modules
pub async fn create_module(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Json(input): Json<CreateModule>,
) -> AppResult<(StatusCode, Json<DataResponse<Module>>)> {
    check_name(&input.name)?;
    let module = ModuleRepo::create(&state.pool, &input).await?;
    tracing::info!(module_id = module.id, "Module created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(module))))
}

/// GET /api/v1/admin/modules/{id}
pub async fn get_module(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Module>>> {
    let module = ModuleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    Ok(Json(DataResponse::new(module)))
}

/// PUT /api/v1/admin/modules/{id}
///
/// Deactivating a module hides it from every flow it is linked into.
pub async fn update_module(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateModule>,
) -> AppResult<Json<DataResponse<Module>>> {
    if let Some(name) = &input.name {
        check_name(name)?;
    }
    let module = ModuleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    tracing::info!(module_id = id, status = ?input.status, "Module updated");
    Ok(Json(DataResponse::new(module)))
}

/// POST /api/v1/admin/modules/{id}/blocks
pub async fn link_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
    Json(input): Json<LinkBlock>,
) -> AppResult<(StatusCode, Json<DataResponse<ModuleBlock>>)> {
    ModuleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| module_not_found(id))?;
    let link = FlowRepo::link_block(&state.pool, id, &input).await?;
    tracing::info!(
        module_id = id,
        block_id = input.block_id,
        sort_order = input.sort_order,
        "Block linked"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(link))))
}

/// DELETE /api/v1/admin/modules/{id}/blocks/{block_id}
pub async fn unlink_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path((id, block_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if !FlowRepo::unlink_block(&state.pool, id, block_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ModuleBlock",
            id: block_id,
        }));
    }
    tracing::info!(module_id = id, block_id, "Block unlinked");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/blocks
pub async fn create_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Json(input): Json<CreateBlock>,
) -> AppResult<(StatusCode, Json<DataResponse<BlockResponse>>)> {
    check_name(&input.name)?;
    input.content.validate()?;

    let block = BlockRepo::create(&state.pool, &input).await?;
    tracing::info!(block_id = block.id, kind = %input.content.kind(), "Block created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(BlockResponse::new(&block)?)),
    ))
}

/// GET /api/v1/admin/blocks/{id}
pub async fn get_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BlockResponse>>> {
    let block = BlockRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| block_not_found(id))?;
    Ok(Json(DataResponse::new(BlockResponse::new(&block)?)))
}

/// PUT /api/v1/admin/blocks/{id}
pub async fn update_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBlock>,
) -> AppResult<Json<DataResponse<BlockResponse>>> {
    if let Some(name) = &input.name {
        check_name(name)?;
    }
    if let Some(content) = &input.content {
        content.validate()?;
    }

    let block = BlockRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| block_not_found(id))?;
    tracing::info!(block_id = id, "Block updated");
    Ok(Json(DataResponse::new(BlockResponse::new(&block)?)))
}

/// DELETE /api/v1/admin/blocks/{id}
pub async fn delete_block(
    State(state): State<AppState>,
    _user: RequireResearcher,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !BlockRepo::delete(&state.pool, id).await? {
        return Err(block_not_found(id));
    }
    tracing::info!(block_id = id, "Block deleted");
    Ok(StatusCode::NO_CONTENT)
}
