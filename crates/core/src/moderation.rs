//! Moderator console: review, approve, reject and delete submissions.
//!
//! Every operation requires a signed-in [`AuthGateway`] session and reloads
//! the full project list (newest first) once the store has answered.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{AuthGateway, Session};
use crate::error::CoreError;
use crate::project::{Project, ProjectOrder, ProjectPatch, ProjectStatus};
use crate::store::ProjectStore;
use crate::types::DbId;

/// Error shown after a failed moderation action.
pub const ACTION_FAILED_MESSAGE: &str = "The action failed. Please try again.";

/// Dashboard counters over the loaded project list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModerationStats {
    pub pending: usize,
    pub active: usize,
    pub rejected: usize,
    pub total_votes: i64,
}

pub struct ModerationConsole {
    store: Arc<dyn ProjectStore>,
    auth: Arc<dyn AuthGateway>,
    projects: Vec<Project>,
    search: String,
    pending_deletion: Option<DbId>,
    last_error: Option<String>,
}

impl ModerationConsole {
    pub fn new(store: Arc<dyn ProjectStore>, auth: Arc<dyn AuthGateway>) -> Self {
        Self {
            store,
            auth,
            projects: Vec::new(),
            search: String::new(),
            pending_deletion: None,
            last_error: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_deletion(&self) -> Option<DbId> {
        self.pending_deletion
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.session().is_some()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Sign in and load the project list.
    ///
    /// A failed load does not undo the sign-in: the session is returned and
    /// the failure is left in [`Self::last_error`] for a later refresh.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, CoreError> {
        let session = self.auth.sign_in(email, password).await?;
        tracing::info!(email = %session.email, "Moderator signed in");
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Signed in but the project list could not be loaded");
        }
        Ok(session)
    }

    /// Sign out and drop everything loaded under the session.
    pub async fn sign_out(&mut self) -> Result<(), CoreError> {
        self.auth.sign_out().await?;
        self.projects.clear();
        self.pending_deletion = None;
        self.last_error = None;
        Ok(())
    }

    fn require_session(&self) -> Result<Session, CoreError> {
        self.auth
            .session()
            .ok_or_else(|| CoreError::Unauthorized("Moderator sign-in required".to_string()))
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Reload every project, newest first.
    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        self.require_session()?;
        match self.reload().await {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load projects for moderation");
                self.last_error = Some(ACTION_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// pending -> active.
    pub async fn approve(&mut self, id: DbId) -> Result<(), CoreError> {
        self.require_session()?;
        let store = Arc::clone(&self.store);
        let result = store.update(id, &ProjectPatch::approve()).await;
        self.finish("approve", id, result).await
    }

    /// pending or active -> rejected. The reason must not be blank.
    pub async fn reject(&mut self, id: DbId, reason: &str) -> Result<(), CoreError> {
        self.require_session()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }
        let store = Arc::clone(&self.store);
        let result = store.update(id, &ProjectPatch::reject(reason)).await;
        self.finish("reject", id, result).await
    }

    /// Ask to permanently delete a rejected project.
    ///
    /// Nothing is removed until [`Self::confirm_delete`].
    pub fn request_delete(&mut self, id: DbId) -> Result<(), CoreError> {
        self.require_session()?;
        let project = self
            .projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        if project.status != ProjectStatus::Rejected {
            return Err(CoreError::Conflict(format!(
                "Only rejected projects can be deleted (project {id} is {})",
                project.status
            )));
        }
        self.pending_deletion = Some(id);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_deletion = None;
    }

    /// Delete the project named by the last [`Self::request_delete`].
    pub async fn confirm_delete(&mut self) -> Result<(), CoreError> {
        self.require_session()?;
        let id = self
            .pending_deletion
            .take()
            .ok_or_else(|| CoreError::Validation("No deletion was requested".to_string()))?;
        let store = Arc::clone(&self.store);
        let result = store.delete(id).await;
        self.finish("delete", id, result).await
    }

    async fn finish(
        &mut self,
        action: &'static str,
        id: DbId,
        result: Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        match result {
            Ok(()) => {
                tracing::info!(project_id = id, action, "Moderation action applied");
                self.refresh().await
            }
            Err(e) => {
                tracing::error!(project_id = id, action, error = %e, "Moderation action failed");
                self.last_error = Some(ACTION_FAILED_MESSAGE.to_string());
                if let Err(reload) = self.reload().await {
                    tracing::warn!(error = %reload, "Reload after failed action also failed");
                }
                Err(e)
            }
        }
    }

    async fn reload(&mut self) -> Result<(), CoreError> {
        self.projects = self.store.select_all(ProjectOrder::NEWEST).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> ModerationStats {
        self.projects
            .iter()
            .fold(ModerationStats::default(), |mut stats, p| {
                match p.status {
                    ProjectStatus::Pending => stats.pending += 1,
                    ProjectStatus::Active => stats.active += 1,
                    ProjectStatus::Rejected => stats.rejected += 1,
                }
                stats.total_votes += p.votes;
                stats
            })
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
    }

    /// Loaded projects whose title or username contains the search text,
    /// ignoring case.
    pub fn filtered(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|p| {
                self.search.is_empty()
                    || p.title.to_lowercase().contains(&self.search)
                    || p.username.to_lowercase().contains(&self.search)
            })
            .collect()
    }
}
