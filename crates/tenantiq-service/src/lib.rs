//! Tenantiq Service: tenant lifecycle orchestration, id generation,
//! the in-process event queue and tracing decorators for the ports.

pub mod config;
pub mod id;
pub mod instrument;
pub mod queue;
pub mod service;

pub use config::ServiceConfig;
pub use instrument::{TracingPublisher, TracingRepository};
pub use queue::{
    EventHandler, EventJob, EventWorker, LoggingHandler, QueueConfig, QueueError, QueuePublisher,
};
pub use service::{CreateTenant, TenantService};
