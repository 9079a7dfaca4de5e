//! Integration tests for the project repository against a real database.

use goodvibes_core::project::{Category, NewProject, ProjectOrder, ProjectPatch, ProjectStatus};
use goodvibes_core::types::DeviceId;
use goodvibes_db::repositories::ProjectRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_project(title: &str, owner: &str) -> NewProject {
    NewProject {
        title: title.to_string(),
        description: "Organize weekend park cleanups".to_string(),
        benefit: "Keeps parks clean for families".to_string(),
        category: Category::Environment,
        username: "EcoHero".to_string(),
        avatar_seed: "avatar-1".to_string(),
        owner_id: DeviceId::from(owner),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_starts_pending_with_zero_votes(pool: PgPool) {
    let row = ProjectRepo::create(&pool, &new_project("Park Cleanup", "dev-1"))
        .await
        .unwrap();
    assert_eq!(row.status, "pending");
    assert_eq!(row.votes, 0);
    assert_eq!(row.owner_id, "dev-1");
    assert!(row.rejection_reason.is_none());

    let found = ProjectRepo::find_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Park Cleanup");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_projects_are_not_listed_as_active(pool: PgPool) {
    let pending = ProjectRepo::create(&pool, &new_project("Pending", "dev-1"))
        .await
        .unwrap();
    let active = ProjectRepo::create(&pool, &new_project("Active", "dev-1"))
        .await
        .unwrap();
    ProjectRepo::update_status(&pool, active.id, ProjectStatus::Pending, &ProjectPatch::approve())
        .await
        .unwrap()
        .unwrap();

    let listed = ProjectRepo::list_by_status(&pool, ProjectStatus::Active, ProjectOrder::MOST_VOTES)
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![active.id]);
    assert!(!ids.contains(&pending.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejected_projects_are_listed_per_owner(pool: PgPool) {
    let mine = ProjectRepo::create(&pool, &new_project("Mine", "me")).await.unwrap();
    let theirs = ProjectRepo::create(&pool, &new_project("Theirs", "them")).await.unwrap();
    for id in [mine.id, theirs.id] {
        ProjectRepo::update_status(&pool, id, ProjectStatus::Pending, &ProjectPatch::reject("spam"))
            .await
            .unwrap()
            .unwrap();
    }

    let listed = ProjectRepo::list_by_status_and_owner(
        &pool,
        ProjectStatus::Rejected,
        &DeviceId::from("me"),
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);
    assert_eq!(listed[0].rejection_reason.as_deref(), Some("spam"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_status_requires_expected_status(pool: PgPool) {
    let row = ProjectRepo::create(&pool, &new_project("Park Cleanup", "dev-1"))
        .await
        .unwrap();
    let stale = ProjectRepo::update_status(&pool, row.id, ProjectStatus::Active, &ProjectPatch::reject("x"))
        .await
        .unwrap();
    assert!(stale.is_none());

    let approved = ProjectRepo::update_status(&pool, row.id, ProjectStatus::Pending, &ProjectPatch::approve())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.status, "active");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reason_is_rejected_by_schema_unless_status_is_rejected(pool: PgPool) {
    let row = ProjectRepo::create(&pool, &new_project("Park Cleanup", "dev-1"))
        .await
        .unwrap();
    let result = sqlx::query("UPDATE projects SET rejection_reason = 'nope' WHERE id = $1")
        .bind(row.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_rejected_projects_can_be_hard_deleted(pool: PgPool) {
    let row = ProjectRepo::create(&pool, &new_project("Park Cleanup", "dev-1"))
        .await
        .unwrap();
    assert!(!ProjectRepo::hard_delete_rejected(&pool, row.id).await.unwrap());

    ProjectRepo::update_status(
        &pool,
        row.id,
        ProjectStatus::Pending,
        &ProjectPatch::reject("duplicate of existing project"),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(ProjectRepo::hard_delete_rejected(&pool, row.id).await.unwrap());
    assert!(ProjectRepo::find_by_id(&pool, row.id).await.unwrap().is_none());
    assert!(ProjectRepo::list_all(&pool, ProjectOrder::NEWEST).await.unwrap().is_empty());
}
