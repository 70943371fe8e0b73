//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn fresh_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db
}

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = fresh_db().await;

    let applied = tenantiq_db::run_migrations(&db).await.unwrap();
    assert_eq!(applied, 1);

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("tenant"), "missing tenant table");
    assert!(info_str.contains("_migration"), "missing _migration table");

    let mut result = db.query("INFO FOR TABLE tenant").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR TABLE should return a value"));
    assert!(info_str.contains("idx_tenant_slug"), "missing slug index");
    assert!(info_str.contains("idx_tenant_status"), "missing status index");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = fresh_db().await;

    assert_eq!(tenantiq_db::run_migrations(&db).await.unwrap(), 1);
    assert_eq!(tenantiq_db::run_migrations(&db).await.unwrap(), 0);

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unknown_status_is_rejected_by_schema() {
    let db = fresh_db().await;
    tenantiq_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE tenant:bad SET \
             name = 'Bad', slug = 'bad', status = 'archived', plan = 'free', \
             created_at = time::now(), updated_at = time::now()",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "status outside the lifecycle should be rejected");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_slugs() {
    let db = fresh_db().await;
    tenantiq_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE tenant:one SET \
         name = 'ACME Corp', slug = 'acme', status = 'creating', plan = 'free', \
         created_at = time::now(), updated_at = time::now()",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let result = db
        .query(
            "CREATE tenant:two SET \
             name = 'Another Corp', slug = 'acme', status = 'creating', plan = 'free', \
             created_at = time::now(), updated_at = time::now()",
        )
        .await
        .unwrap()
        .check();

    let err = result.expect_err("duplicate slug should be rejected");
    assert!(err.to_string().contains("idx_tenant_slug"), "{err}");
}
