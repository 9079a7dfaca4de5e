//! Moderator authentication gate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::CoreError;
use crate::types::Timestamp;

/// An authenticated moderator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub email: String,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= chrono::Utc::now()
    }
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError>;

    async fn sign_out(&self) -> Result<(), CoreError>;

    /// The current session, if any. Expired sessions read as `None`.
    fn session(&self) -> Option<Session>;

    /// Watch sign-in and sign-out. The receiver sees every later change.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Read the live session from a watch channel, hiding expired ones.
pub fn current_session(sessions: &watch::Sender<Option<Session>>) -> Option<Session> {
    sessions
        .borrow()
        .as_ref()
        .filter(|s| !s.is_expired())
        .cloned()
}
