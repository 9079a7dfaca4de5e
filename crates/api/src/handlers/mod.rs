pub mod admin;
pub mod auth;
pub mod project;
pub mod vote;

use goodvibes_core::error::CoreError;
use goodvibes_core::project::Project;
use goodvibes_db::models::project::ProjectRow;

/// Convert database rows into domain projects.
pub(crate) fn into_projects(rows: Vec<ProjectRow>) -> Result<Vec<Project>, CoreError> {
    rows.into_iter().map(Project::try_from).collect()
}
