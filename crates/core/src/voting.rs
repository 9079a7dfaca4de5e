//! Public voting page state.
//!
//! Loads the projects visible to this device (active ones plus the device's
//! own rejected submissions) and coordinates each vote through the local
//! ledger and the store's atomic increment. A vote is applied optimistically
//! in [`VotingView::begin_vote`] and reconciled with the store's answer in
//! [`VotingView::complete_vote`].

use std::cmp::Reverse;
use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::identity::IdentityProvider;
use crate::ledger::LocalVoteLedger;
use crate::project::{Project, ProjectOrder, ProjectStatus};
use crate::store::{ProjectStore, VoteReceipt};
use crate::types::{DbId, DeviceId};

/// Card error shown after a vote failed to reach the store.
pub const VOTE_FAILED_MESSAGE: &str = "Your vote could not be saved. Please try again.";

/// Per-card voting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePhase {
    /// The device may vote.
    Open,
    /// Support was clicked; waiting for explicit confirmation.
    Confirming,
    /// Vote applied locally, store call in flight.
    Submitting,
    /// This device has voted.
    Voted,
    /// The project is rejected and takes no votes.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteCard {
    pub project: Project,
    pub phase: VotePhase,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// No store is configured for this client.
    NotConfigured,
    /// The store could not be queried.
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Disconnected(DisconnectReason),
    Ready,
}

/// A vote applied locally and awaiting the store's answer.
#[derive(Debug)]
#[must_use = "a pending vote must be passed to `complete_vote`"]
pub struct PendingVote {
    project_id: DbId,
    voter: DeviceId,
}

impl PendingVote {
    pub fn project_id(&self) -> DbId {
        self.project_id
    }

    pub fn voter(&self) -> &DeviceId {
        &self.voter
    }
}

pub struct VotingView {
    store: Option<Arc<dyn ProjectStore>>,
    identity: Arc<dyn IdentityProvider>,
    ledger: LocalVoteLedger,
    state: ViewState,
    cards: Vec<VoteCard>,
}

impl VotingView {
    pub fn new(
        store: Option<Arc<dyn ProjectStore>>,
        identity: Arc<dyn IdentityProvider>,
        ledger: LocalVoteLedger,
    ) -> Self {
        Self {
            store,
            identity,
            ledger,
            state: ViewState::Loading,
            cards: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Cards in display order.
    pub fn cards(&self) -> &[VoteCard] {
        &self.cards
    }

    pub fn card(&self, id: DbId) -> Option<&VoteCard> {
        self.cards.iter().find(|c| c.project.id == id)
    }

    /// Fetch the visible projects.
    ///
    /// Any failure leaves the view disconnected with no cards.
    pub async fn load(&mut self) {
        self.state = ViewState::Loading;
        let Some(store) = self.store.clone() else {
            self.cards.clear();
            self.state = ViewState::Disconnected(DisconnectReason::NotConfigured);
            return;
        };

        let device = self.identity.device_id();
        match fetch_visible(store.as_ref(), &device).await {
            Ok(projects) => {
                self.cards = projects
                    .into_iter()
                    .filter(|p| p.is_visible_to(&device))
                    .map(|project| {
                        let phase = if project.status == ProjectStatus::Rejected {
                            VotePhase::Closed
                        } else if self.ledger.has_voted(project.id) {
                            VotePhase::Voted
                        } else {
                            VotePhase::Open
                        };
                        VoteCard {
                            project,
                            phase,
                            error: None,
                        }
                    })
                    .collect();
                self.resort();
                self.state = ViewState::Ready;
                tracing::debug!(cards = self.cards.len(), "Voting view loaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load projects");
                self.cards.clear();
                self.state = ViewState::Disconnected(DisconnectReason::Unreachable(e.to_string()));
            }
        }
    }

    /// First click on "support": ask for confirmation.
    ///
    /// Returns whether the card moved to [`VotePhase::Confirming`].
    pub fn support(&mut self, id: DbId) -> bool {
        let voted = self.ledger.has_voted(id);
        let Some(card) = self.card_mut(id) else {
            return false;
        };
        if card.phase != VotePhase::Open {
            return false;
        }
        if voted {
            card.phase = VotePhase::Voted;
            return false;
        }
        card.phase = VotePhase::Confirming;
        card.error = None;
        true
    }

    /// Back out of the confirmation step.
    pub fn cancel(&mut self, id: DbId) {
        if let Some(card) = self.card_mut(id) {
            if card.phase == VotePhase::Confirming {
                card.phase = VotePhase::Open;
            }
        }
    }

    /// Apply a confirmed vote locally: ledger entry, optimistic +1.
    pub fn begin_vote(&mut self, id: DbId) -> Result<PendingVote, CoreError> {
        let voted = self.ledger.has_voted(id);
        let card = self
            .card_mut(id)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        match card.phase {
            VotePhase::Confirming if !voted => {}
            VotePhase::Confirming | VotePhase::Voted => {
                card.phase = VotePhase::Voted;
                return Err(CoreError::Conflict(
                    "This device has already voted for this project".to_string(),
                ));
            }
            VotePhase::Closed => {
                return Err(CoreError::Conflict(format!(
                    "Project {id} is not open for voting"
                )));
            }
            VotePhase::Submitting => {
                return Err(CoreError::Conflict(
                    "A vote for this project is already in flight".to_string(),
                ));
            }
            VotePhase::Open => {
                return Err(CoreError::Validation(
                    "The vote must be confirmed first".to_string(),
                ));
            }
        }

        card.phase = VotePhase::Submitting;
        card.project.votes += 1;
        card.error = None;
        self.ledger.record_vote(id);
        self.resort();

        Ok(PendingVote {
            project_id: id,
            voter: self.identity.device_id(),
        })
    }

    /// Reconcile an optimistic vote with the store's answer.
    ///
    /// On success the card adopts the store's counter, which also undoes the
    /// optimistic increment when the store had already counted this voter.
    /// On failure the ledger entry and the increment are rolled back.
    pub fn complete_vote(&mut self, pending: PendingVote, result: Result<VoteReceipt, CoreError>) {
        let id = pending.project_id;
        match result {
            Ok(receipt) => {
                if receipt.counted {
                    tracing::info!(project_id = id, votes = receipt.votes, "Vote counted");
                } else {
                    tracing::info!(
                        project_id = id,
                        votes = receipt.votes,
                        "Vote was already counted for this device"
                    );
                }
                if let Some(card) = self.card_mut(id) {
                    card.project.votes = receipt.votes;
                    card.phase = VotePhase::Voted;
                    card.error = None;
                }
            }
            Err(e) => {
                tracing::error!(project_id = id, error = %e, "Vote failed, reverting");
                self.ledger.forget(id);
                if let Some(card) = self.card_mut(id) {
                    card.project.votes = (card.project.votes - 1).max(0);
                    card.phase = VotePhase::Open;
                    card.error = Some(VOTE_FAILED_MESSAGE.to_string());
                }
            }
        }
        self.resort();
    }

    /// Commit a confirmed vote against the store.
    pub async fn confirm(&mut self, id: DbId) -> Result<VoteReceipt, CoreError> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| CoreError::Unavailable("No project store configured".to_string()))?;
        let pending = self.begin_vote(id)?;
        let result = store.increment_vote(id, pending.voter()).await;
        self.complete_vote(pending, result.clone());
        result
    }

    /// Vote count to display. Hidden until this device has voted.
    pub fn visible_votes(&self, id: DbId) -> Option<i64> {
        self.card(id)
            .filter(|c| matches!(c.phase, VotePhase::Submitting | VotePhase::Voted))
            .map(|c| c.project.votes)
    }

    fn card_mut(&mut self, id: DbId) -> Option<&mut VoteCard> {
        self.cards.iter_mut().find(|c| c.project.id == id)
    }

    /// Own rejected projects first, then by votes descending. Stable.
    fn resort(&mut self) {
        self.cards.sort_by_key(|c| {
            (
                c.project.status != ProjectStatus::Rejected,
                Reverse(c.project.votes),
            )
        });
    }
}

async fn fetch_visible(
    store: &dyn ProjectStore,
    device: &DeviceId,
) -> Result<Vec<Project>, CoreError> {
    let mut projects = store
        .select_by_status_and_owner(ProjectStatus::Rejected, device)
        .await?;
    projects.extend(
        store
            .select_by_status(ProjectStatus::Active, ProjectOrder::MOST_VOTES)
            .await?,
    );
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::identity::StaticIdentity;
    use crate::memory::InMemoryProjectStore;
    use crate::project::Category;
    use crate::storage::MemoryStorage;

    fn project(id: DbId, status: ProjectStatus, votes: i64, owner: &str) -> Project {
        Project {
            id,
            title: format!("Project {id}"),
            description: "A description of the project".into(),
            benefit: "A benefit for the community".into(),
            category: Category::Community,
            username: "Someone".into(),
            avatar_seed: "avatar-2".into(),
            owner_id: DeviceId::from(owner),
            status,
            votes,
            rejection_reason: (status == ProjectStatus::Rejected).then(|| "off-topic".into()),
            created_at: chrono::Utc::now(),
        }
    }

    async fn view_with(projects: Vec<Project>) -> (VotingView, Arc<InMemoryProjectStore>) {
        let store = Arc::new(InMemoryProjectStore::new());
        for p in projects {
            store.seed(p).await;
        }
        let view = VotingView::new(
            Some(store.clone()),
            Arc::new(StaticIdentity(DeviceId::from("me"))),
            LocalVoteLedger::new(Arc::new(MemoryStorage::new())),
        );
        (view, store)
    }

    #[tokio::test]
    async fn load_without_store_is_not_configured() {
        let mut view = VotingView::new(
            None,
            Arc::new(StaticIdentity(DeviceId::from("me"))),
            LocalVoteLedger::new(Arc::new(MemoryStorage::new())),
        );
        view.load().await;
        assert_eq!(
            view.state(),
            &ViewState::Disconnected(DisconnectReason::NotConfigured)
        );
        assert!(view.cards().is_empty());
    }

    #[tokio::test]
    async fn load_failure_is_unreachable_with_empty_list() {
        let (mut view, store) = view_with(vec![project(1, ProjectStatus::Active, 0, "x")]).await;
        store.set_offline(true);
        view.load().await;
        assert_matches!(
            view.state(),
            ViewState::Disconnected(DisconnectReason::Unreachable(_))
        );
        assert!(view.cards().is_empty());
    }

    #[tokio::test]
    async fn own_rejected_is_pinned_first_and_closed() {
        let (mut view, _) = view_with(vec![
            project(1, ProjectStatus::Active, 3, "x"),
            project(2, ProjectStatus::Active, 9, "x"),
            project(3, ProjectStatus::Rejected, 0, "me"),
            project(4, ProjectStatus::Rejected, 0, "someone-else"),
            project(5, ProjectStatus::Pending, 0, "me"),
        ])
        .await;
        view.load().await;

        let ids: Vec<DbId> = view.cards().iter().map(|c| c.project.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(view.card(3).unwrap().phase, VotePhase::Closed);
        assert!(!view.support(3));
    }

    #[tokio::test]
    async fn votes_are_hidden_until_voted() {
        let (mut view, _) = view_with(vec![project(1, ProjectStatus::Active, 4, "x")]).await;
        view.load().await;
        assert_eq!(view.visible_votes(1), None);

        assert!(view.support(1));
        view.confirm(1).await.unwrap();
        assert_eq!(view.visible_votes(1), Some(5));
        assert_eq!(view.card(1).unwrap().phase, VotePhase::Voted);
    }

    #[tokio::test]
    async fn cancel_returns_to_open_without_voting() {
        let (mut view, store) = view_with(vec![project(1, ProjectStatus::Active, 0, "x")]).await;
        view.load().await;
        assert!(view.support(1));
        view.cancel(1);
        assert_eq!(view.card(1).unwrap().phase, VotePhase::Open);
        assert_matches!(view.confirm(1).await, Err(CoreError::Validation(_)));
        assert_eq!(store.get(1).await.unwrap().votes, 0);
    }

    #[tokio::test]
    async fn optimistic_increment_is_visible_before_completion() {
        let (mut view, _) = view_with(vec![project(1, ProjectStatus::Active, 2, "x")]).await;
        view.load().await;
        view.support(1);
        let pending = view.begin_vote(1).unwrap();
        assert_eq!(view.card(1).unwrap().phase, VotePhase::Submitting);
        assert_eq!(view.visible_votes(1), Some(3));

        view.complete_vote(
            pending,
            Ok(VoteReceipt {
                project_id: 1,
                votes: 7,
                counted: true,
            }),
        );
        assert_eq!(view.visible_votes(1), Some(7));
    }

    #[tokio::test]
    async fn failed_vote_is_rolled_back() {
        let (mut view, store) = view_with(vec![project(1, ProjectStatus::Active, 2, "x")]).await;
        view.load().await;
        store.set_offline(true);

        view.support(1);
        assert_matches!(view.confirm(1).await, Err(CoreError::Unavailable(_)));

        let card = view.card(1).unwrap();
        assert_eq!(card.phase, VotePhase::Open);
        assert_eq!(card.project.votes, 2);
        assert_eq!(card.error.as_deref(), Some(VOTE_FAILED_MESSAGE));

        // Manual retry once the store is back.
        store.set_offline(false);
        assert!(view.support(1));
        assert!(view.card(1).unwrap().error.is_none());
        let receipt = view.confirm(1).await.unwrap();
        assert_eq!(receipt.votes, 3);
    }

    #[tokio::test]
    async fn duplicate_caught_by_store_adopts_server_count() {
        let (mut view, store) = view_with(vec![project(1, ProjectStatus::Active, 0, "x")]).await;
        store
            .increment_vote(1, &DeviceId::from("me"))
            .await
            .unwrap();
        view.load().await;

        // The ledger is empty, so the view allows a second attempt.
        view.support(1);
        let receipt = view.confirm(1).await.unwrap();
        assert!(!receipt.counted);
        assert_eq!(view.card(1).unwrap().project.votes, 1);
        assert_eq!(view.card(1).unwrap().phase, VotePhase::Voted);
    }

    #[tokio::test]
    async fn cards_resort_by_votes_after_a_vote() {
        let (mut view, _) = view_with(vec![
            project(1, ProjectStatus::Active, 5, "x"),
            project(2, ProjectStatus::Active, 5, "x"),
        ])
        .await;
        view.load().await;
        let before: Vec<DbId> = view.cards().iter().map(|c| c.project.id).collect();
        let last = before[1];

        view.support(last);
        view.confirm(last).await.unwrap();
        assert_eq!(view.cards()[0].project.id, last);
    }
}
