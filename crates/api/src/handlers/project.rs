//! Handlers for the public `/projects` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use goodvibes_core::error::CoreError;
use goodvibes_core::project::{Category, NewProject, Project, ProjectOrder, ProjectStatus};
use goodvibes_core::submission::validate_new_project;
use goodvibes_core::types::DeviceId;
use goodvibes_db::repositories::ProjectRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::into_projects;
use crate::query::OrderParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /projects`.
#[derive(Debug, Deserialize)]
pub struct ListProjectsParams {
    /// `active` (default) or `rejected`.
    pub status: Option<String>,
    /// Restrict to one submitting device. Required for `rejected`.
    pub owner_id: Option<String>,
    #[serde(flatten)]
    pub order: OrderParams,
}

/// Request body for `POST /projects`.
///
/// Upper bounds are checked here; the minimum lengths come from the same
/// rules the submission form applies.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(max = 5000))]
    pub benefit: String,
    pub category: String,
    #[validate(length(max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 64))]
    pub avatar_seed: String,
    #[validate(length(min = 1, max = 128))]
    pub owner_id: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Public listing. Active projects are visible to everyone; rejected ones
/// only together with the submitting device's `owner_id`. Pending projects
/// are never listed here.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListProjectsParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let status: ProjectStatus = params
        .status
        .as_deref()
        .unwrap_or(ProjectStatus::Active.as_str())
        .parse()?;
    let owner = params
        .owner_id
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(DeviceId::from);

    let rows = match (status, owner) {
        (ProjectStatus::Pending, _) => {
            return Err(CoreError::Forbidden(
                "Pending projects are not publicly visible".into(),
            )
            .into())
        }
        (ProjectStatus::Rejected, None) => {
            return Err(CoreError::Forbidden(
                "Rejected projects are only visible to their submitter".into(),
            )
            .into())
        }
        (status, Some(owner)) => {
            ProjectRepo::list_by_status_and_owner(&state.pool, status, &owner).await?
        }
        (status, None) => {
            let order = params.order.resolve(ProjectOrder::MOST_VOTES)?;
            ProjectRepo::list_by_status(&state.pool, status, order).await?
        }
    };

    Ok(Json(DataResponse {
        data: into_projects(rows)?,
    }))
}

/// POST /api/v1/projects
///
/// Submit a new proposal. It always starts pending with zero votes.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    let category: Category = input.category.trim().parse()?;
    let new_project = NewProject {
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        benefit: input.benefit.trim().to_string(),
        category,
        username: input.username.trim().to_string(),
        avatar_seed: input.avatar_seed.trim().to_string(),
        owner_id: DeviceId::from(input.owner_id.trim()),
    };
    validate_new_project(&new_project)?;

    let row = ProjectRepo::create(&state.pool, &new_project).await?;
    let project = Project::try_from(row)?;
    tracing::info!(project_id = project.id, category = %project.category, "Project submitted");

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}
