//! In-process implementations of the store and auth collaborators.
//!
//! Used for demo mode and throughout the test suites. They enforce the same
//! rules as the PostgreSQL-backed service: new projects start pending,
//! transitions are validated, only rejected projects can be deleted and each
//! voter is counted at most once per project.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::auth::{current_session, AuthGateway, Session};
use crate::error::CoreError;
use crate::project::{NewProject, Project, ProjectOrder, ProjectPatch, ProjectStatus};
use crate::store::{ProjectStore, VoteReceipt};
use crate::submission::validate_new_project;
use crate::types::{DbId, DeviceId};

/// Session lifetime issued by [`MemoryAuthGateway`].
pub const SESSION_TTL_MINS: i64 = 60;

// ---------------------------------------------------------------------------
// Project store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    next_id: DbId,
    projects: BTreeMap<DbId, Project>,
    votes: HashSet<(DbId, DeviceId)>,
}

/// Project store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    state: Mutex<StoreState>,
    offline: AtomicBool,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store: every call fails with
    /// [`CoreError::Unavailable`] until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert a fully formed project as-is, bypassing creation rules.
    pub async fn seed(&self, project: Project) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(project.id);
        state.projects.insert(project.id, project);
    }

    pub async fn get(&self, id: DbId) -> Option<Project> {
        self.state.lock().await.projects.get(&id).cloned()
    }

    fn ensure_online(&self) -> Result<(), CoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CoreError::Unavailable(
                "In-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, project: &NewProject) -> Result<Project, CoreError> {
        self.ensure_online()?;
        validate_new_project(project)?;

        let mut state = self.state.lock().await;
        state.next_id += 1;
        let created = Project {
            id: state.next_id,
            title: project.title.clone(),
            description: project.description.clone(),
            benefit: project.benefit.clone(),
            category: project.category,
            username: project.username.clone(),
            avatar_seed: project.avatar_seed.clone(),
            owner_id: project.owner_id.clone(),
            status: ProjectStatus::Pending,
            votes: 0,
            rejection_reason: None,
            created_at: chrono::Utc::now(),
        };
        state.projects.insert(created.id, created.clone());
        tracing::debug!(project_id = created.id, "Project inserted");
        Ok(created)
    }

    async fn select_by_status(
        &self,
        status: ProjectStatus,
        order: ProjectOrder,
    ) -> Result<Vec<Project>, CoreError> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        order.sort(&mut projects);
        Ok(projects)
    }

    async fn select_by_status_and_owner(
        &self,
        status: ProjectStatus,
        owner: &DeviceId,
    ) -> Result<Vec<Project>, CoreError> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.status == status && &p.owner_id == owner)
            .cloned()
            .collect();
        ProjectOrder::NEWEST.sort(&mut projects);
        Ok(projects)
    }

    async fn select_all(&self, order: ProjectOrder) -> Result<Vec<Project>, CoreError> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut projects: Vec<Project> = state.projects.values().cloned().collect();
        order.sort(&mut projects);
        Ok(projects)
    }

    async fn update(&self, id: DbId, patch: &ProjectPatch) -> Result<(), CoreError> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        patch.validate_against(project.status)?;

        project.status = patch.status;
        project.rejection_reason = match patch.status {
            ProjectStatus::Rejected => patch
                .rejection_reason
                .as_deref()
                .map(|r| r.trim().to_string()),
            _ => None,
        };
        tracing::debug!(project_id = id, status = %patch.status, "Project updated");
        Ok(())
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let status = state
            .projects
            .get(&id)
            .map(|p| p.status)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        if status != ProjectStatus::Rejected {
            return Err(CoreError::Conflict(format!(
                "Only rejected projects can be deleted (project {id} is {status})"
            )));
        }
        state.projects.remove(&id);
        state.votes.retain(|(project_id, _)| *project_id != id);
        tracing::debug!(project_id = id, "Project deleted");
        Ok(())
    }

    async fn increment_vote(&self, id: DbId, voter: &DeviceId) -> Result<VoteReceipt, CoreError> {
        self.ensure_online()?;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        if project.status != ProjectStatus::Active {
            return Err(CoreError::Conflict(format!(
                "Project {id} is not open for voting"
            )));
        }

        let counted = state.votes.insert((id, voter.clone()));
        if counted {
            project.votes += 1;
        }
        Ok(VoteReceipt {
            project_id: id,
            votes: project.votes,
            counted,
        })
    }
}

// ---------------------------------------------------------------------------
// Auth gateway
// ---------------------------------------------------------------------------

/// Auth gateway over a fixed set of moderator credentials.
pub struct MemoryAuthGateway {
    credentials: HashMap<String, String>,
    sessions: watch::Sender<Option<Session>>,
}

impl MemoryAuthGateway {
    pub fn new() -> Self {
        Self {
            credentials: HashMap::new(),
            sessions: watch::Sender::new(None),
        }
    }

    /// Register a moderator account.
    pub fn with_moderator(mut self, email: &str, password: &str) -> Self {
        self.credentials
            .insert(email.trim().to_lowercase(), password.to_string());
        self
    }
}

impl Default for MemoryAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for MemoryAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        let email = email.trim().to_lowercase();
        match self.credentials.get(&email) {
            Some(expected) if expected == password => {}
            _ => {
                tracing::warn!(email = %email, "Rejected moderator sign-in");
                return Err(CoreError::Unauthorized(
                    "Invalid email or password".to_string(),
                ));
            }
        }

        let session = Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            email,
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(SESSION_TTL_MINS),
        };
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        self.sessions.send_replace(None);
        Ok(())
    }

    fn session(&self) -> Option<Session> {
        current_session(&self.sessions)
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::project::Category;

    fn new_project(owner: &str) -> NewProject {
        NewProject {
            title: "Park Cleanup".into(),
            description: "Organize weekend park cleanups".into(),
            benefit: "Keeps parks clean for families".into(),
            category: Category::Environment,
            username: "EcoHero".into(),
            avatar_seed: "avatar-1".into(),
            owner_id: DeviceId::from(owner),
        }
    }

    #[tokio::test]
    async fn insert_creates_pending_project_with_zero_votes() {
        let store = InMemoryProjectStore::new();
        let project = store.insert(&new_project("dev-1")).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Pending);
        assert_eq!(project.votes, 0);
        assert_eq!(project.owner_id.as_str(), "dev-1");
    }

    #[tokio::test]
    async fn insert_rejects_invalid_fields() {
        let store = InMemoryProjectStore::new();
        let mut request = new_project("dev-1");
        request.title = "ab".into();
        assert_matches!(store.insert(&request).await, Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn votes_only_count_on_active_projects_once_per_voter() {
        let store = InMemoryProjectStore::new();
        let id = store.insert(&new_project("dev-1")).await.unwrap().id;
        let voter = DeviceId::from("voter");

        assert_matches!(
            store.increment_vote(id, &voter).await,
            Err(CoreError::Conflict(_))
        );

        store.update(id, &ProjectPatch::approve()).await.unwrap();
        let first = store.increment_vote(id, &voter).await.unwrap();
        assert!(first.counted);
        assert_eq!(first.votes, 1);

        let again = store.increment_vote(id, &voter).await.unwrap();
        assert!(!again.counted);
        assert_eq!(again.votes, 1);
    }

    #[tokio::test]
    async fn voting_on_missing_project_is_not_found() {
        let store = InMemoryProjectStore::new();
        assert_matches!(
            store.increment_vote(99, &DeviceId::from("v")).await,
            Err(CoreError::NotFound { id: 99, .. })
        );
    }

    #[tokio::test]
    async fn update_enforces_transitions_and_reason() {
        let store = InMemoryProjectStore::new();
        let id = store.insert(&new_project("dev-1")).await.unwrap().id;

        assert_matches!(
            store.update(id, &ProjectPatch::reject("   ")).await,
            Err(CoreError::Validation(_))
        );
        store
            .update(id, &ProjectPatch::reject(" duplicate "))
            .await
            .unwrap();
        let rejected = store.get(id).await.unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate"));

        assert_matches!(
            store.update(id, &ProjectPatch::approve()).await,
            Err(CoreError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn delete_requires_rejected_status() {
        let store = InMemoryProjectStore::new();
        let id = store.insert(&new_project("dev-1")).await.unwrap().id;
        assert_matches!(store.delete(id).await, Err(CoreError::Conflict(_)));

        store.update(id, &ProjectPatch::reject("spam")).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.get(id).await.is_none());
        assert_matches!(store.delete(id).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = InMemoryProjectStore::new();
        store.set_offline(true);
        assert_matches!(
            store.select_all(ProjectOrder::NEWEST).await,
            Err(CoreError::Unavailable(_))
        );
        store.set_offline(false);
        assert!(store.select_all(ProjectOrder::NEWEST).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_in_publishes_session_and_sign_out_clears_it() {
        let auth = MemoryAuthGateway::new().with_moderator("mod@example.org", "secret");
        let mut changes = auth.subscribe();
        assert!(auth.session().is_none());

        assert_matches!(
            auth.sign_in("mod@example.org", "wrong").await,
            Err(CoreError::Unauthorized(_))
        );

        let session = auth.sign_in(" MOD@example.org ", "secret").await.unwrap();
        assert_eq!(session.email, "mod@example.org");
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow().as_ref(), Some(&session));
        assert_eq!(auth.session(), Some(session));

        auth.sign_out().await.unwrap();
        changes.changed().await.unwrap();
        assert!(changes.borrow().is_none());
        assert!(auth.session().is_none());
    }
}
