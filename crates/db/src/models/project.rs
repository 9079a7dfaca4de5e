//! Project row model.

use goodvibes_core::error::CoreError;
use goodvibes_core::project::{Category, Project, ProjectStatus};
use goodvibes_core::types::{DbId, DeviceId, Timestamp};
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub benefit: String,
    pub category: String,
    pub username: String,
    pub avatar_seed: String,
    pub owner_id: String,
    pub status: String,
    pub votes: i64,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = CoreError;

    /// Fails only if a row holds a status or category the CHECK constraints
    /// should have rejected.
    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status: ProjectStatus = row.status.parse().map_err(|_| {
            CoreError::Internal(format!(
                "Project {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        let category: Category = row.category.parse().map_err(|_| {
            CoreError::Internal(format!(
                "Project {} has unknown category '{}'",
                row.id, row.category
            ))
        })?;
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            benefit: row.benefit,
            category,
            username: row.username,
            avatar_seed: row.avatar_seed,
            owner_id: DeviceId::from(row.owner_id),
            status,
            votes: row.votes,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        })
    }
}
