//! Moderator account model.

use goodvibes_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full row from the `moderators` table.
///
/// Contains the password hash. Never serialize it into a response.
#[derive(Debug, Clone, FromRow)]
pub struct Moderator {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Moderator {
    /// Whether the account is locked at `now`.
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderator(locked_until: Option<Timestamp>) -> Moderator {
        Moderator {
            id: 1,
            email: "mod@example.org".into(),
            password_hash: "hash".into(),
            failed_login_count: 0,
            locked_until,
            last_login_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn lock_expires() {
        let now = chrono::Utc::now();
        assert!(!moderator(None).is_locked(now));
        assert!(moderator(Some(now + chrono::Duration::minutes(5))).is_locked(now));
        assert!(!moderator(Some(now - chrono::Duration::minutes(5))).is_locked(now));
    }
}
