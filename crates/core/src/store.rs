//! The remote project store as seen by the client components.
//!
//! Implemented by [`crate::memory::InMemoryProjectStore`] for demo mode and
//! tests, and by the HTTP client in `goodvibes-client` for the real
//! service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::{NewProject, Project, ProjectOrder, ProjectPatch, ProjectStatus};
use crate::types::{DbId, DeviceId};

/// Result of a vote increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub project_id: DbId,
    /// The project's vote counter after the operation.
    pub votes: i64,
    /// `false` when the store already held a vote from this voter; the
    /// counter was left unchanged.
    pub counted: bool,
}

/// Persistent store of projects and votes.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Create a project. The store assigns the id and timestamp and always
    /// starts it as pending with zero votes.
    async fn insert(&self, project: &NewProject) -> Result<Project, CoreError>;

    async fn select_by_status(
        &self,
        status: ProjectStatus,
        order: ProjectOrder,
    ) -> Result<Vec<Project>, CoreError>;

    async fn select_by_status_and_owner(
        &self,
        status: ProjectStatus,
        owner: &DeviceId,
    ) -> Result<Vec<Project>, CoreError>;

    /// Every project regardless of status. Moderator only.
    async fn select_all(&self, order: ProjectOrder) -> Result<Vec<Project>, CoreError>;

    /// Apply a moderation patch. Moderator only.
    async fn update(&self, id: DbId, patch: &ProjectPatch) -> Result<(), CoreError>;

    /// Permanently delete a rejected project. Moderator only.
    async fn delete(&self, id: DbId) -> Result<(), CoreError>;

    /// Atomically add one vote from `voter`, at most once per voter and
    /// project. Only active projects accept votes.
    async fn increment_vote(&self, id: DbId, voter: &DeviceId) -> Result<VoteReceipt, CoreError>;
}
