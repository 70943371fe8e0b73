//! Tenantiq Core: the tenant lifecycle model, the transition table,
//! the validators that enforce it, and the ports the orchestration
//! service is written against.
//!
//! Nothing in this crate performs I/O. Storage and event delivery live
//! behind [`repository::TenantRepository`] and
//! [`publisher::EventPublisher`].

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod publisher;
pub mod repository;
pub mod validator;

pub use error::{PersistenceError, TenantiqError, TenantiqResult, TransitionError};
pub use lifecycle::{TableError, Transition, TransitionTable};
pub use models::tenant::{Event, Status, Tenant, TenantId};
pub use validator::{MachineValidator, TableValidator, TransitionValidator};
