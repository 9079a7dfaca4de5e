//! Route definitions for the public `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{project, vote};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /              -> list (?status=&owner_id=&order=&direction=)
/// POST   /              -> create
/// POST   /{id}/votes    -> cast vote
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}/votes", post(vote::cast))
}
