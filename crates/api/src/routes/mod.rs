pub mod admin;
pub mod auth;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                      login (public)
/// /auth/logout                     logout (requires auth)
///
/// /projects                        list (public), submit (public)
/// /projects/{id}/votes             cast vote (public)
///
/// /admin/projects                  list all (moderator)
/// /admin/projects/{id}             approve/reject, delete (moderator)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/admin", admin::router())
}
