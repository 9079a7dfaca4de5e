//! Route definitions for the moderator `/admin` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every route requires a moderator token.
///
/// ```text
/// GET    /projects         -> list (?order=&direction=)
/// PATCH  /projects/{id}    -> update_status
/// DELETE /projects/{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(admin::list))
        .route(
            "/projects/{id}",
            patch(admin::update_status).delete(admin::delete),
        )
}
