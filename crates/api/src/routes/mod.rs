pub mod admin;
pub mod auth;
pub mod health;
pub mod projects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                                       login (public)
/// /auth/refresh                                     refresh (public)
/// /auth/logout                                      logout (requires auth)
///
/// /projects/{project_id}/consent                    consent form (public), submit
/// /projects/{project_id}/flow                       ordered flow with statuses
/// /projects/{project_id}/progress                   completion rollup
/// /projects/{project_id}/modules/{m}/blocks/{b}     open block, status, submission
/// /projects/{project_id}/progress/{m}/{b}           reset own progress
/// /projects/{project_id}/notes                      list, create
/// /projects/{project_id}/participation              withdraw
///
/// /admin/projects                                   list, create (researcher)
/// /admin/projects/{id}                              get, update, delete (admin)
/// /admin/projects/{id}/participants                 list, remove, reset progress
/// /admin/projects/{id}/consent-responses            list
/// /admin/projects/{id}/consent-form                 save, delete (?override=)
/// /admin/projects/{id}/modules                      link, unlink
/// /admin/modules                                    list, create, get, update
/// /admin/modules/{id}/blocks                        link, unlink
/// /admin/blocks                                     create, get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", projects::router())
        .nest("/admin", admin::router())
}
