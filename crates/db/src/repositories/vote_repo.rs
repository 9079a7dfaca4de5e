//! Repository for the `project_votes` table and the vote counter.

use goodvibes_core::project::ProjectStatus;
use goodvibes_core::types::{DbId, DeviceId};
use sqlx::PgPool;

/// Outcome of [`VoteRepo::cast`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was recorded; carries the new counter.
    Counted(i64),
    /// This voter had already voted; carries the unchanged counter.
    AlreadyCounted(i64),
    /// The project exists but is not active.
    NotOpen(String),
    NotFound,
}

pub struct VoteRepo;

impl VoteRepo {
    /// Record one vote from `voter` and bump the counter, atomically.
    ///
    /// The project row is locked for the duration of the transaction, the
    /// vote row is inserted with `ON CONFLICT DO NOTHING`, and the counter is
    /// only incremented when that insert added a row.
    pub async fn cast(
        pool: &PgPool,
        project_id: DbId,
        voter: &DeviceId,
    ) -> Result<VoteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT status, votes FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((status, votes)) = current else {
            return Ok(VoteOutcome::NotFound);
        };
        if status != ProjectStatus::Active.as_str() {
            return Ok(VoteOutcome::NotOpen(status));
        }

        let inserted = sqlx::query(
            "INSERT INTO project_votes (project_id, voter_id)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_project_votes_project_voter DO NOTHING",
        )
        .bind(project_id)
        .bind(voter.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.commit().await?;
            return Ok(VoteOutcome::AlreadyCounted(votes));
        }

        let (votes,): (i64,) = sqlx::query_as(
            "UPDATE projects SET votes = votes + 1, updated_at = NOW()
             WHERE id = $1
             RETURNING votes",
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VoteOutcome::Counted(votes))
    }

    /// Number of recorded votes for a project.
    pub async fn count_for_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_votes WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
