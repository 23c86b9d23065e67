//! Administrative routes mounted at `/admin`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{admin_content, admin_projects};
use crate::state::AppState;

/// ```text
/// GET    /projects                                         -> list
/// POST   /projects                                         -> create
/// GET    /projects/{id}                                    -> get_by_id
/// PUT    /projects/{id}                                    -> update
/// DELETE /projects/{id}                                    -> delete (admin)
/// GET    /projects/{id}/participants                       -> list_participants
/// DELETE /projects/{id}/participants/{user_id}             -> remove_participant
/// DELETE /projects/{id}/participants/{user_id}/progress/{module_id}/{block_id}
///                                                          -> reset_participant_progress
/// GET    /projects/{id}/consent-responses                  -> list_consent_responses
/// PUT    /projects/{id}/consent-form                       -> save_consent_form
/// DELETE /projects/{id}/consent-form                       -> delete_consent_form
/// POST   /projects/{id}/modules                            -> link_module
/// DELETE /projects/{id}/modules/{module_id}                -> unlink_module
///
/// GET    /modules                                          -> list_modules
/// POST   /modules                                          -> create_module
/// GET    /modules/{id}                                     -> get_module
/// PUT    /modules/{id}                                     -> update_module
/// POST   /modules/{id}/blocks                              -> link_block
/// DELETE /modules/{id}/blocks/{block_id}                   -> unlink_block
///
/// POST   /blocks                                           -> create_block
/// GET    /blocks/{id}                                      -> get_block
/// PUT    /blocks/{id}                                      -> update_block
/// DELETE /blocks/{id}                                      -> delete_block
/// ```
pub fn router() -> Router<AppState> {
    let project_routes = Router::new()
        .route("/", get(admin_projects::list).post(admin_projects::create))
        .route(
            "/{id}",
            get(admin_projects::get_by_id)
                .put(admin_projects::update)
                .delete(admin_projects::delete),
        )
        .route("/{id}/participants", get(admin_projects::list_participants))
        .route(
            "/{id}/participants/{user_id}",
            delete(admin_projects::remove_participant),
        )
        .route(
            "/{id}/participants/{user_id}/progress/{module_id}/{block_id}",
            delete(admin_projects::reset_participant_progress),
        )
        .route(
            "/{id}/consent-responses",
            get(admin_projects::list_consent_responses),
        )
        .route(
            "/{id}/consent-form",
            put(admin_projects::save_consent_form)
                .delete(admin_projects::delete_consent_form),
        )
        .route("/{id}/modules", post(admin_projects::link_module))
        .route(
            "/{id}/modules/{module_id}",
            delete(admin_projects::unlink_module),
        );

    let module_routes = Router::new()
        .route(
            "/",
            get(admin_content::list_modules).post(admin_content::create_module),
        )
        .route(
            "/{id}",
            get(admin_content::get_module).put(admin_content::update_module),
        )
        .route("/{id}/blocks", post(admin_content::link_block))
        .route(
            "/{id}/blocks/{block_id}",
            delete(admin_content::unlink_block),
        );

    let block_routes = Router::new()
        .route("/", post(admin_content::create_block))
        .route(
            "/{id}",
            get(admin_content::get_block)
                .put(admin_content::update_block)
                .delete(admin_content::delete_block),
        );

    Router::new()
        .nest("/projects", project_routes)
        .nest("/modules", module_routes)
        .nest("/blocks", block_routes)
}
