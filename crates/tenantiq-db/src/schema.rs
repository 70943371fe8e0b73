//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. Tenant ids are the record keys. Statuses are
//! stored as their canonical lowercase names with an ASSERT constraint,
//! so stored data never depends on enum declaration order.
//!
//! The UNIQUE index on `slug` is what actually guarantees slug
//! uniqueness; any read-before-insert check elsewhere is only a fast
//! path.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "tenant_table",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: tenant table
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['creating', 'active', 'suspended', 'deleting', \
    'deleted'];
DEFINE FIELD plan ON TABLE tenant TYPE string;
DEFINE FIELD version ON TABLE tenant TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime;
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime;
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug UNIQUE;
DEFINE INDEX idx_tenant_status ON TABLE tenant COLUMNS status;
DEFINE INDEX idx_tenant_created_at ON TABLE tenant COLUMNS created_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Apply every migration newer than the recorded schema version.
///
/// Returns how many migrations were applied; `0` means the schema was
/// already current, so calling this on every start-up is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current)
        .collect();

    for migration in &pending {
        apply(db, migration).await?;
    }

    if pending.is_empty() {
        info!(version = current, "Schema is up to date");
    }
    Ok(pending.len())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}': {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("recording v{}: {e}", migration.version))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_slug_index() {
        assert!(SCHEMA_V1.contains("idx_tenant_slug"));
        assert!(SCHEMA_V1.contains("UNIQUE"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
