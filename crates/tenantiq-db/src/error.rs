//! Database-specific error types and conversions.

use tenantiq_core::error::{PersistenceError, TenantiqError};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: tenant with id {id}")]
    NotFound { id: String },

    #[error("Unique index violated: slug {slug}")]
    DuplicateSlug { slug: String },

    #[error("Stale version for tenant {id}")]
    VersionConflict { id: String },

    /// The engine aborted the statement because a concurrent transaction
    /// wrote the same keys. Callers decide what the loser sees.
    #[error("Transaction conflict: {0}")]
    TxConflict(String),
}

impl DbError {
    /// Classify a failed statement: unique-index violations on the slug
    /// index become [`DbError::DuplicateSlug`], aborted transactions a
    /// [`DbError::TxConflict`], everything else a [`DbError::Query`].
    pub(crate) fn from_statement(err: surrealdb::Error, slug: &str) -> Self {
        classify(err.to_string(), slug)
    }
}

fn classify(message: String, slug: &str) -> DbError {
    if message.contains("idx_tenant_slug") && message.contains("already contains") {
        DbError::DuplicateSlug {
            slug: slug.to_string(),
        }
    } else if is_tx_conflict(&message) {
        DbError::TxConflict(message)
    } else {
        DbError::Query(message)
    }
}

fn is_tx_conflict(message: &str) -> bool {
    message.contains("Transaction conflict")
        || message.contains("Transaction write conflict")
        || message.contains("retry the transaction")
}

impl From<DbError> for TenantiqError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { id } => TenantiqError::NotFound { id },
            DbError::DuplicateSlug { slug } => TenantiqError::SlugConflict { slug },
            DbError::VersionConflict { id } => PersistenceError::Conflict { id }.into(),
            other => PersistenceError::Storage(other.to_string()).into(),
        }
    }
}
