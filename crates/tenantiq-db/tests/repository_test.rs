//! Integration tests for the SurrealDB tenant repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tenantiq_core::error::{PersistenceError, TenantiqError};
use tenantiq_core::models::tenant::{Status, Tenant, TenantId};
use tenantiq_core::repository::{ListFilter, TenantRepository};
use tenantiq_db::repository::SurrealTenantRepository;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> SurrealTenantRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tenantiq_db::run_migrations(&db).await.unwrap();
    SurrealTenantRepository::new(db)
}

fn tenant(id: &str, slug: &str) -> Tenant {
    Tenant::new(TenantId::new(id), format!("Tenant {slug}"), slug, "free")
}

/// A tenant created `minutes_ago`, for ordering tests.
fn aged_tenant(id: &str, slug: &str, status: Status, minutes_ago: i64) -> Tenant {
    let at = Utc::now() - Duration::minutes(minutes_ago);
    Tenant::restore(
        TenantId::new(id),
        format!("Tenant {slug}"),
        slug.to_string(),
        status,
        "free".to_string(),
        0,
        at,
        at,
    )
}

#[tokio::test]
async fn create_and_get_tenant() {
    let repo = setup().await;

    let created = repo.create(&tenant("t1", "acme")).await.unwrap();
    assert_eq!(created.id.as_str(), "t1");
    assert_eq!(created.status(), Status::Creating);
    assert_eq!(created.version, 0);

    let fetched = repo.get_by_id(&TenantId::new("t1")).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Tenant acme");
    assert_eq!(fetched.slug, "acme");
    assert_eq!(fetched.plan, "free");
    assert_eq!(fetched.status(), Status::Creating);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_missing_tenant_is_not_found() {
    let repo = setup().await;

    let err = repo.get_by_id(&TenantId::new("nope")).await.unwrap_err();
    assert!(matches!(err, TenantiqError::NotFound { id } if id == "nope"));
}

#[tokio::test]
async fn get_tenant_by_slug() {
    let repo = setup().await;
    repo.create(&tenant("t1", "acme")).await.unwrap();

    let fetched = repo.get_by_slug("acme").await.unwrap();
    assert_eq!(fetched.id.as_str(), "t1");

    let err = repo.get_by_slug("globex").await.unwrap_err();
    assert!(matches!(err, TenantiqError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_slug_is_a_slug_conflict() {
    let repo = setup().await;
    repo.create(&tenant("t1", "acme")).await.unwrap();

    let err = repo.create(&tenant("t2", "acme")).await.unwrap_err();
    assert!(
        matches!(&err, TenantiqError::SlugConflict { slug } if slug == "acme"),
        "unexpected error: {err:?}"
    );

    // The losing record was never written.
    let err = repo.get_by_id(&TenantId::new("t2")).await.unwrap_err();
    assert!(matches!(err, TenantiqError::NotFound { .. }));
}

#[tokio::test]
async fn list_orders_newest_first() {
    let repo = setup().await;
    repo.create(&aged_tenant("old", "old", Status::Active, 30))
        .await
        .unwrap();
    repo.create(&aged_tenant("mid", "mid", Status::Creating, 20))
        .await
        .unwrap();
    repo.create(&aged_tenant("new", "new", Status::Active, 10))
        .await
        .unwrap();

    let all = repo.list(&ListFilter::default()).await.unwrap();
    let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn list_filters_by_status() {
    let repo = setup().await;
    repo.create(&aged_tenant("a", "a", Status::Active, 30))
        .await
        .unwrap();
    repo.create(&aged_tenant("b", "b", Status::Suspended, 20))
        .await
        .unwrap();
    repo.create(&aged_tenant("c", "c", Status::Active, 10))
        .await
        .unwrap();

    let active = repo
        .list(&ListFilter::with_status(Status::Active))
        .await
        .unwrap();
    let ids: Vec<_> = active.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);

    let deleted = repo
        .list(&ListFilter::with_status(Status::Deleted))
        .await
        .unwrap();
    assert!(deleted.is_empty());
}

#[tokio::test]
async fn list_paginates() {
    let repo = setup().await;
    for (i, minutes) in [50, 40, 30, 20, 10].into_iter().enumerate() {
        let id = format!("t{i}");
        repo.create(&aged_tenant(&id, &id, Status::Active, minutes))
            .await
            .unwrap();
    }

    let page = repo
        .list(&ListFilter {
            status: None,
            limit: 2,
            offset: 1,
        })
        .await
        .unwrap();
    let ids: Vec<_> = page.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t2"]);

    let past_end = repo
        .list(&ListFilter {
            status: None,
            limit: 10,
            offset: 10,
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn update_persists_status_and_bumps_version() {
    let repo = setup().await;
    let mut stored = repo.create(&tenant("t1", "acme")).await.unwrap();

    stored.apply_transition(Status::Active);
    let updated = repo.update(&stored).await.unwrap();
    assert_eq!(updated.version, 1);
    assert_eq!(updated.status(), Status::Active);

    let fetched = repo.get_by_id(&stored.id).await.unwrap();
    assert_eq!(fetched.status(), Status::Active);
    assert_eq!(fetched.version, 1);
    assert!(fetched.updated_at >= fetched.created_at);
}

#[tokio::test]
async fn stale_update_is_a_retryable_conflict() {
    let repo = setup().await;
    let created = repo.create(&tenant("t1", "acme")).await.unwrap();

    let mut first = created.clone();
    first.apply_transition(Status::Active);
    repo.update(&first).await.unwrap();

    // Second writer still holds version 0.
    let mut second = created;
    second.apply_transition(Status::Active);
    let err = repo.update(&second).await.unwrap_err();
    assert!(
        matches!(
            &err,
            TenantiqError::Persistence(PersistenceError::Conflict { id }) if id == "t1"
        ),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());

    let fetched = repo.get_by_id(&TenantId::new("t1")).await.unwrap();
    assert_eq!(fetched.version, 1);
}

#[tokio::test]
async fn update_of_missing_tenant_is_not_found() {
    let repo = setup().await;

    let err = repo.update(&tenant("ghost", "ghost")).await.unwrap_err();
    assert!(matches!(err, TenantiqError::NotFound { id } if id == "ghost"));
}
