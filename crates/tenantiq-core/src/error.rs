//! Error types for the Tenantiq core.

use thiserror::Error;

use crate::models::tenant::{Event, Status};

/// An event that is not allowed from the tenant's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event \"{event}\" is not valid from state \"{current}\"")]
pub struct TransitionError {
    pub event: Event,
    pub current: Status,
}

/// Storage failure unrelated to missing records or slug uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The record changed between read and write. Safe to retry the
    /// whole operation.
    #[error("tenant {id} was modified concurrently")]
    Conflict { id: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl PersistenceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistenceError::Conflict { .. })
    }
}

#[derive(Debug, Error)]
pub enum TenantiqError {
    #[error("tenant not found: {id}")]
    NotFound { id: String },

    #[error("slug \"{slug}\" is already in use")]
    SlugConflict { slug: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Event emission failed. Whatever was persisted before stays.
    #[error("publish error: {0}")]
    Publish(String),

    /// The caller cancelled before anything was written.
    #[error("operation cancelled")]
    Cancelled,
}

impl TenantiqError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TenantiqError::Persistence(err) => err.is_retryable(),
            _ => false,
        }
    }
}

pub type TenantiqResult<T> = Result<T, TenantiqError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0:?}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event: {0:?}")]
pub struct UnknownEvent(pub String);
