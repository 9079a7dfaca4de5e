//! End-to-end client flows over the in-memory store.

use std::sync::Arc;

use futures::future::join_all;
use goodvibes_core::identity::{DeviceIdentity, IdentityProvider, StaticIdentity};
use goodvibes_core::ledger::LocalVoteLedger;
use goodvibes_core::memory::{InMemoryProjectStore, MemoryAuthGateway};
use goodvibes_core::moderation::ModerationConsole;
use goodvibes_core::project::{ProjectOrder, ProjectPatch, ProjectStatus};
use goodvibes_core::storage::{ClientStorage, FileStorage, MemoryStorage};
use goodvibes_core::store::ProjectStore;
use goodvibes_core::submission::{FieldEdit, FormPhase, SubmissionForm};
use goodvibes_core::types::DeviceId;
use goodvibes_core::voting::{VotePhase, VotingView};

const EMAIL: &str = "mod@example.org";
const PASSWORD: &str = "correct-horse-battery";

async fn submit_park_cleanup(store: &InMemoryProjectStore, identity: &dyn IdentityProvider) -> i64 {
    let mut form = SubmissionForm::new();
    form.edit(FieldEdit::Agreed(true));
    assert!(form.next());
    form.edit(FieldEdit::Title("Park Cleanup".into()));
    form.edit(FieldEdit::Category("environment".into()));
    form.edit(FieldEdit::Description("Organize weekend park cleanups".into()));
    assert!(form.next());
    form.edit(FieldEdit::Benefit("Keeps parks clean for families".into()));
    assert!(form.next());
    form.edit(FieldEdit::Username("EcoHero".into()));
    assert!(form.next());

    let project = form.submit(Some(store), identity).await.unwrap();
    assert_eq!(form.phase(), &FormPhase::Submitted(project.clone()));
    project.id
}

fn view(
    store: &Arc<InMemoryProjectStore>,
    device: &str,
    storage: Arc<dyn ClientStorage>,
) -> VotingView {
    let store: Arc<dyn ProjectStore> = store.clone();
    VotingView::new(
        Some(store),
        Arc::new(StaticIdentity(DeviceId::from(device))),
        LocalVoteLedger::new(storage),
    )
}

#[tokio::test]
async fn submitted_idea_waits_for_review() {
    let store = Arc::new(InMemoryProjectStore::new());
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
    let identity = DeviceIdentity::new(storage.clone());

    let id = submit_park_cleanup(&store, &identity).await;
    let project = store.get(id).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Pending);
    assert_eq!(project.votes, 0);
    assert_eq!(project.owner_id, identity.device_id());

    let mut voting = VotingView::new(
        Some(store.clone()),
        Arc::new(identity),
        LocalVoteLedger::new(storage),
    );
    voting.load().await;
    assert!(voting.card(id).is_none());
}

#[tokio::test]
async fn concurrent_devices_each_add_one_vote() {
    let store = Arc::new(InMemoryProjectStore::new());
    let id = submit_park_cleanup(&store, &StaticIdentity(DeviceId::from("owner"))).await;
    store.update(id, &ProjectPatch::approve()).await.unwrap();

    let voters: Vec<_> = (0..20).map(|n| DeviceId::from(format!("device-{n}"))).collect();
    let receipts = join_all(voters.iter().map(|v| store.increment_vote(id, v))).await;
    assert!(receipts.iter().all(|r| r.as_ref().is_ok_and(|r| r.counted)));
    assert_eq!(store.get(id).await.unwrap().votes, 20);

    // A repeat from any of them changes nothing.
    let again = store.increment_vote(id, &voters[3]).await.unwrap();
    assert!(!again.counted);
    assert_eq!(again.votes, 20);
}

#[tokio::test]
async fn vote_survives_reload_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.json");
    let store = Arc::new(InMemoryProjectStore::new());
    let id = submit_park_cleanup(&store, &StaticIdentity(DeviceId::from("owner"))).await;
    store.update(id, &ProjectPatch::approve()).await.unwrap();

    let mut first = view(&store, "device-1", Arc::new(FileStorage::new(&path)));
    first.load().await;
    assert!(first.support(id));
    let receipt = first.confirm(id).await.unwrap();
    assert_eq!(receipt.votes, 1);

    let mut reloaded = view(&store, "device-1", Arc::new(FileStorage::new(&path)));
    reloaded.load().await;
    assert_eq!(reloaded.card(id).unwrap().phase, VotePhase::Voted);
    assert_eq!(reloaded.visible_votes(id), Some(1));
    assert!(!reloaded.support(id));
}

#[tokio::test]
async fn rejected_idea_is_shown_only_to_its_owner() {
    let store = Arc::new(InMemoryProjectStore::new());
    let id = submit_park_cleanup(&store, &StaticIdentity(DeviceId::from("device-1"))).await;
    store
        .update(id, &ProjectPatch::reject("duplicate of existing project"))
        .await
        .unwrap();

    let mut owner = view(&store, "device-1", Arc::new(MemoryStorage::new()));
    owner.load().await;
    let card = owner.card(id).unwrap();
    assert_eq!(card.phase, VotePhase::Closed);
    assert_eq!(
        card.project.rejection_reason.as_deref(),
        Some("duplicate of existing project")
    );

    let mut stranger = view(&store, "device-2", Arc::new(MemoryStorage::new()));
    stranger.load().await;
    assert!(stranger.card(id).is_none());
}

#[tokio::test]
async fn moderator_rejects_then_deletes() {
    let store = Arc::new(InMemoryProjectStore::new());
    let auth = Arc::new(MemoryAuthGateway::new().with_moderator(EMAIL, PASSWORD));
    let id = submit_park_cleanup(&store, &StaticIdentity(DeviceId::from("device-1"))).await;

    let mut console = ModerationConsole::new(store.clone(), auth);
    console.sign_in(EMAIL, PASSWORD).await.unwrap();
    console
        .reject(id, "duplicate of existing project")
        .await
        .unwrap();
    console.request_delete(id).unwrap();
    console.confirm_delete().await.unwrap();

    assert!(console.projects().is_empty());
    assert!(store.get(id).await.is_none());
    assert!(store.select_all(ProjectOrder::NEWEST).await.unwrap().is_empty());
    assert!(store
        .select_by_status_and_owner(ProjectStatus::Rejected, &DeviceId::from("device-1"))
        .await
        .unwrap()
        .is_empty());
}

#[test]
fn corrupt_profile_file_keeps_identity_and_votes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    std::fs::write(&path, b"{truncated").unwrap();

    let first = DeviceIdentity::new(Arc::new(FileStorage::new(&path))).device_id();
    LocalVoteLedger::new(Arc::new(FileStorage::new(&path))).record_vote(1);

    let after_restart = DeviceIdentity::new(Arc::new(FileStorage::new(&path))).device_id();
    assert_eq!(first, after_restart);
    assert!(LocalVoteLedger::new(Arc::new(FileStorage::new(&path))).has_voted(1));
}
