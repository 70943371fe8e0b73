//! In-process event queue.
//!
//! [`QueuePublisher`] implements the publisher port by enqueueing an
//! [`EventJob`] snapshot on a bounded channel; [`EventWorker`] drains the
//! channel and hands each job to an [`EventHandler`]. Delivery is
//! at-least-once from the handler's point of view: a failed job is
//! retried up to [`QueueConfig::max_attempts`] times.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantiq_core::error::{TenantiqError, TenantiqResult};
use tenantiq_core::models::tenant::{Event, Status, Tenant};
use tenantiq_core::publisher::EventPublisher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Jobs buffered before `publish` waits for the worker (default: 1024).
    pub capacity: usize,
    /// Handler attempts per job before it is dropped (default: 3).
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("event queue is closed")]
    Closed,

    #[error("handler failed: {0}")]
    Handler(String),
}

impl From<QueueError> for TenantiqError {
    fn from(err: QueueError) -> Self {
        TenantiqError::Publish(err.to_string())
    }
}

/// A published lifecycle event with the tenant as it was when the event
/// fired, so handlers never need to read storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventJob {
    pub job_id: Uuid,
    pub event: Event,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub status: Status,
    pub plan: String,
    pub enqueued_at: DateTime<Utc>,
}

impl EventJob {
    pub const KIND: &'static str = "event.published";

    pub fn new(event: Event, tenant: &Tenant) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            event,
            tenant_id: tenant.id.to_string(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            status: tenant.status(),
            plan: tenant.plan.clone(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }
}

/// Create a connected publisher and worker.
pub fn queue<H: EventHandler>(
    config: &QueueConfig,
    handler: H,
) -> (QueuePublisher, EventWorker<H>) {
    let (sender, receiver) = mpsc::channel(config.capacity.max(1));
    (
        QueuePublisher { sender },
        EventWorker {
            receiver,
            handler,
            max_attempts: config.max_attempts.max(1),
        },
    )
}

/// Publisher port backed by the in-process queue.
#[derive(Debug, Clone)]
pub struct QueuePublisher {
    sender: mpsc::Sender<EventJob>,
}

impl EventPublisher for QueuePublisher {
    async fn publish(&self, event: Event, tenant: &Tenant) -> TenantiqResult<()> {
        let job = EventJob::new(event, tenant);
        let job_id = job.job_id;
        self.sender
            .send(job)
            .await
            .map_err(|_| QueueError::Closed)?;
        debug!(%job_id, kind = EventJob::KIND, event = %event, tenant_id = %tenant.id, "Event enqueued");
        Ok(())
    }
}

/// Consumer of queued events.
pub trait EventHandler: Send + Sync {
    fn handle(&self, job: &EventJob) -> impl Future<Output = Result<(), QueueError>> + Send;
}

/// Default handler: log the event and succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    async fn handle(&self, job: &EventJob) -> Result<(), QueueError> {
        info!(
            job_id = %job.job_id,
            event = %job.event,
            tenant_id = %job.tenant_id,
            tenant_slug = %job.slug,
            status = %job.status,
            "Processing event"
        );
        Ok(())
    }
}

/// Drains the queue into an [`EventHandler`].
pub struct EventWorker<H> {
    receiver: mpsc::Receiver<EventJob>,
    handler: H,
    max_attempts: u32,
}

impl<H: EventHandler> EventWorker<H> {
    /// Process jobs until every publisher is dropped or `shutdown` fires.
    /// On shutdown the queue is closed and whatever is already buffered
    /// is still processed. Returns the number of jobs handled.
    pub async fn run(mut self, shutdown: CancellationToken) -> usize {
        info!("Event worker started");
        let mut processed = 0;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                job = self.receiver.recv() => match job {
                    Some(job) => {
                        self.process(job).await;
                        processed += 1;
                    }
                    None => {
                        info!(processed, "Event queue closed, worker stopping");
                        return processed;
                    }
                },
            }
        }

        self.receiver.close();
        let mut drained = 0;
        while let Some(job) = self.receiver.recv().await {
            self.process(job).await;
            drained += 1;
        }
        info!(processed = processed + drained, drained, "Event worker drained");
        processed + drained
    }

    async fn process(&self, job: EventJob) {
        for attempt in 1..=self.max_attempts {
            match self.handler.handle(&job).await {
                Ok(()) => {
                    debug!(job_id = %job.job_id, attempt, "Event handled");
                    return;
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(job_id = %job.job_id, attempt, error = %e, "Event handler failed, retrying");
                }
                Err(e) => {
                    error!(
                        job_id = %job.job_id,
                        event = %job.event,
                        tenant_id = %job.tenant_id,
                        attempts = attempt,
                        error = %e,
                        "Event dropped after final attempt"
                    );
                }
            }
        }
    }
}
