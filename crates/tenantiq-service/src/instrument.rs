//! Tracing decorators for the repository and publisher ports.
//!
//! Each wrapper implements the same port as the value it wraps, opens a
//! span per call and logs failures at `warn`. Results pass through
//! untouched.

use tenantiq_core::error::TenantiqResult;
use tenantiq_core::models::tenant::{Event, Tenant, TenantId};
use tenantiq_core::publisher::EventPublisher;
use tenantiq_core::repository::{ListFilter, TenantRepository};
use tracing::{Instrument, field, info_span, warn};

/// Log a failed call inside the current span.
fn record<T>(op: &'static str, result: TenantiqResult<T>) -> TenantiqResult<T> {
    if let Err(e) = &result {
        warn!(op, error = %e, "Port call failed");
    }
    result
}

/// [`TenantRepository`] wrapper that traces every call.
#[derive(Debug, Clone)]
pub struct TracingRepository<R> {
    inner: R,
}

impl<R> TracingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: TenantRepository> TenantRepository for TracingRepository<R> {
    async fn create(&self, tenant: &Tenant) -> TenantiqResult<Tenant> {
        let span = info_span!(
            "TenantRepository.create",
            tenant.id = %tenant.id,
            tenant.slug = %tenant.slug,
            tenant.status = %tenant.status(),
        );
        async { record("create", self.inner.create(tenant).await) }
            .instrument(span)
            .await
    }

    async fn get_by_id(&self, id: &TenantId) -> TenantiqResult<Tenant> {
        let span = info_span!("TenantRepository.get_by_id", tenant.id = %id);
        async { record("get_by_id", self.inner.get_by_id(id).await) }
            .instrument(span)
            .await
    }

    async fn get_by_slug(&self, slug: &str) -> TenantiqResult<Tenant> {
        let span = info_span!("TenantRepository.get_by_slug", tenant.slug = %slug);
        async { record("get_by_slug", self.inner.get_by_slug(slug).await) }
            .instrument(span)
            .await
    }

    async fn list(&self, filter: &ListFilter) -> TenantiqResult<Vec<Tenant>> {
        let span = info_span!(
            "TenantRepository.list",
            filter.status = filter.status.map(|s| s.as_str()).unwrap_or(""),
            filter.limit = filter.limit,
            filter.offset = filter.offset,
            result.count = field::Empty,
        );
        let result = record("list", self.inner.list(filter).instrument(span.clone()).await);
        if let Ok(tenants) = &result {
            span.record("result.count", tenants.len());
        }
        result
    }

    async fn update(&self, tenant: &Tenant) -> TenantiqResult<Tenant> {
        let span = info_span!(
            "TenantRepository.update",
            tenant.id = %tenant.id,
            tenant.status = %tenant.status(),
            tenant.version = tenant.version,
        );
        async { record("update", self.inner.update(tenant).await) }
            .instrument(span)
            .await
    }
}

/// [`EventPublisher`] wrapper that traces every call.
#[derive(Debug, Clone)]
pub struct TracingPublisher<P> {
    inner: P,
}

impl<P> TracingPublisher<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: EventPublisher> EventPublisher for TracingPublisher<P> {
    async fn publish(&self, event: Event, tenant: &Tenant) -> TenantiqResult<()> {
        let span = info_span!(
            "EventPublisher.publish",
            "event.type" = %event,
            tenant.id = %tenant.id,
            tenant.status = %tenant.status(),
        );
        async { record("publish", self.inner.publish(event, tenant).await) }
            .instrument(span)
            .await
    }
}
