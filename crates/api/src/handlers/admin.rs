//! Moderator handlers under `/admin/projects`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use goodvibes_core::error::CoreError;
use goodvibes_core::project::{Project, ProjectOrder, ProjectPatch, ProjectStatus};
use goodvibes_core::types::DbId;
use goodvibes_db::repositories::ProjectRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::into_projects;
use crate::middleware::rbac::RequireModerator;
use crate::query::OrderParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PATCH /admin/projects/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

/// GET /api/v1/admin/projects
///
/// Every project regardless of status, newest first by default.
pub async fn list(
    RequireModerator(_moderator): RequireModerator,
    State(state): State<AppState>,
    Query(params): Query<OrderParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let order = params.resolve(ProjectOrder::NEWEST)?;
    let rows = ProjectRepo::list_all(&state.pool, order).await?;
    Ok(Json(DataResponse {
        data: into_projects(rows)?,
    }))
}

/// PATCH /api/v1/admin/projects/{id}
///
/// Approve or reject. The transition is validated against the current
/// status and applied only if nobody changed the project in between.
pub async fn update_status(
    RequireModerator(moderator): RequireModerator,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let patch = ProjectPatch {
        status: input.status.trim().parse()?,
        rejection_reason: input.rejection_reason,
    };

    let current = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::project_not_found(id))?;
    let current = Project::try_from(current)?;
    patch.validate_against(current.status)?;

    let row = ProjectRepo::update_status(&state.pool, id, current.status, &patch)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!("Project {id} was changed by someone else"))
        })?;
    let project = Project::try_from(row)?;

    tracing::info!(
        project_id = id,
        moderator_id = moderator.user_id,
        from = %current.status,
        to = %project.status,
        "Project status changed"
    );
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/admin/projects/{id}
///
/// Permanently remove a rejected project and its votes.
pub async fn delete(
    RequireModerator(moderator): RequireModerator,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let current = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::project_not_found(id))?;
    if current.status != ProjectStatus::Rejected.as_str() {
        return Err(CoreError::Conflict(format!(
            "Only rejected projects can be deleted (project {id} is {})",
            current.status
        ))
        .into());
    }

    if !ProjectRepo::hard_delete_rejected(&state.pool, id).await? {
        return Err(CoreError::Conflict(format!("Project {id} was changed by someone else")).into());
    }

    tracing::info!(project_id = id, moderator_id = moderator.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
