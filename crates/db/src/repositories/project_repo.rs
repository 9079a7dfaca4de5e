//! Repository for the `projects` table.

use goodvibes_core::project::{NewProject, ProjectOrder, ProjectPatch, ProjectStatus};
use goodvibes_core::types::{DbId, DeviceId};
use sqlx::PgPool;

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, benefit, category, username, avatar_seed, \
                        owner_id, status, votes, rejection_reason, created_at, updated_at";

fn order_clause(order: ProjectOrder) -> String {
    let direction = order.direction.as_str();
    format!("ORDER BY {} {direction}, id {direction}", order.column.as_str())
}

/// Provides persistence operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project. Status and votes always take the column
    /// defaults (`pending`, 0).
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (title, description, benefit, category, username, avatar_seed, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.benefit)
            .bind(input.category.as_str())
            .bind(&input.username)
            .bind(&input.avatar_seed)
            .bind(input.owner_id.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects with the given status.
    pub async fn list_by_status(
        pool: &PgPool,
        status: ProjectStatus,
        order: ProjectOrder,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE status = $1 {}",
            order_clause(order)
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// List one device's projects with the given status, newest first.
    pub async fn list_by_status_and_owner(
        pool: &PgPool,
        status: ProjectStatus,
        owner: &DeviceId,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE status = $1 AND owner_id = $2 {}",
            order_clause(ProjectOrder::NEWEST)
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(status.as_str())
            .bind(owner.as_str())
            .fetch_all(pool)
            .await
    }

    /// List every project regardless of status.
    pub async fn list_all(
        pool: &PgPool,
        order: ProjectOrder,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects {}", order_clause(order));
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// Apply a moderation patch, provided the project is still in `expected`.
    ///
    /// The caller validates the transition from `expected`. Returns `None`
    /// when no project with that id and status exists, e.g. because another
    /// moderator changed it in the meantime.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: ProjectStatus,
        patch: &ProjectPatch,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let reason = match patch.status {
            ProjectStatus::Rejected => patch.rejection_reason.as_deref().map(str::trim),
            _ => None,
        };
        let query = format!(
            "UPDATE projects SET
                status = $3,
                rejection_reason = $4,
                updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(patch.status.as_str())
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a rejected project and its votes.
    ///
    /// Returns `true` if a row was removed.
    pub async fn hard_delete_rejected(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND status = 'rejected'")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
