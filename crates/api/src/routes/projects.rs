//! Participant-facing routes mounted at `/projects`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{consent, participation};
use crate::state::AppState;

/// ```text
/// GET    /{project_id}/consent                                    -> consent::get_form
/// POST   /{project_id}/consent                                    -> consent::submit
/// GET    /{project_id}/flow                                       -> flow
/// GET    /{project_id}/progress                                   -> progress
/// GET    /{project_id}/modules/{module_id}/blocks/{block_id}      -> open_block
/// PUT    /{project_id}/modules/{module_id}/blocks/{block_id}/status      -> write_status
/// POST   /{project_id}/modules/{module_id}/blocks/{block_id}/submission  -> submit_form
/// DELETE /{project_id}/progress/{module_id}/{block_id}            -> reset_progress
/// GET    /{project_id}/notes                                      -> list_notes
/// POST   /{project_id}/notes                                      -> create_note
/// DELETE /{project_id}/participation                              -> withdraw
/// ```
pub fn router() -> Router<AppState> {
    let block_routes = Router::new()
        .route("/", get(participation::open_block))
        .route("/status", put(participation::write_status))
        .route("/submission", post(participation::submit_form));

    Router::new()
        .route(
            "/{project_id}/consent",
            get(consent::get_form).post(consent::submit),
        )
        .route("/{project_id}/flow", get(participation::flow))
        .route("/{project_id}/progress", get(participation::progress))
        .nest(
            "/{project_id}/modules/{module_id}/blocks/{block_id}",
            block_routes,
        )
        .route(
            "/{project_id}/progress/{module_id}/{block_id}",
            delete(participation::reset_progress),
        )
        .route(
            "/{project_id}/notes",
            get(participation::list_notes).post(participation::create_note),
        )
        .route(
            "/{project_id}/participation",
            delete(participation::withdraw),
        )
}
