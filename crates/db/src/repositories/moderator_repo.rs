//! Repository for the `moderators` table.

use goodvibes_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::moderator::Moderator;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, failed_login_count, locked_until, \
                        last_login_at, created_at, updated_at";

pub struct ModeratorRepo;

impl ModeratorRepo {
    /// Create a moderator, or replace the password of an existing one with
    /// the same email. Used for bootstrapping from configuration.
    pub async fn upsert(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> Result<Moderator, sqlx::Error> {
        let query = format!(
            "INSERT INTO moderators (email, password_hash)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_moderators_email DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Moderator>(&query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(pool)
            .await
    }

    /// Find a moderator by email (case-sensitive; callers normalise).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Moderator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM moderators WHERE email = $1");
        sqlx::query_as::<_, Moderator>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Increment the failed login counter by 1.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE moderators SET failed_login_count = failed_login_count + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Lock a moderator account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE moderators SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Reset the failure counter, clear any lock and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE moderators SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
