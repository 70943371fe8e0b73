//! Tenant lifecycle orchestration: create, read, list and transition.

use tenantiq_core::error::{TenantiqError, TenantiqResult};
use tenantiq_core::models::tenant::{Event, Tenant, TenantId};
use tenantiq_core::publisher::EventPublisher;
use tenantiq_core::repository::{ListFilter, TenantRepository};
use tenantiq_core::validator::TransitionValidator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::id;

/// Input for the create flow.
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub plan: String,
}

/// Tenant lifecycle service.
///
/// Generic over its ports so the orchestration has no dependency on a
/// particular database or queue. Holds nothing mutable; one instance
/// can serve any number of concurrent calls.
pub struct TenantService<R, P, V> {
    repo: R,
    publisher: P,
    validator: V,
    config: ServiceConfig,
}

impl<R, P, V> TenantService<R, P, V>
where
    R: TenantRepository,
    P: EventPublisher,
    V: TransitionValidator,
{
    pub fn new(repo: R, publisher: P, validator: V) -> Self {
        Self::with_config(repo, publisher, validator, ServiceConfig::default())
    }

    pub fn with_config(repo: R, publisher: P, validator: V, config: ServiceConfig) -> Self {
        Self {
            repo,
            publisher,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Register a new tenant in `creating` and announce it with
    /// `provision_complete`.
    ///
    /// A publish failure is reported as [`TenantiqError::Publish`] but
    /// the tenant stays stored.
    pub async fn create(
        &self,
        input: CreateTenant,
        cancel: &CancellationToken,
    ) -> TenantiqResult<Tenant> {
        // 1. Slug pre-check. The storage unique index still decides races.
        match race(cancel, self.repo.get_by_slug(&input.slug)).await {
            Ok(_) => {
                return Err(TenantiqError::SlugConflict { slug: input.slug });
            }
            Err(TenantiqError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // 2. Build the tenant.
        let tenant = Tenant::new(id::generate_id(), input.name, input.slug, input.plan);

        // 3. Persist.
        ensure_live(cancel)?;
        let tenant = self.repo.create(&tenant).await?;
        info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            plan = %tenant.plan,
            "Tenant created"
        );

        // 4. Announce.
        self.emit(Event::ProvisionComplete, &tenant, cancel).await?;
        Ok(tenant)
    }

    pub async fn get_by_id(
        &self,
        id: &TenantId,
        cancel: &CancellationToken,
    ) -> TenantiqResult<Tenant> {
        race(cancel, self.repo.get_by_id(id)).await
    }

    /// List tenants newest first. A non-zero limit is capped at
    /// [`ServiceConfig::max_list_limit`].
    pub async fn list(
        &self,
        filter: ListFilter,
        cancel: &CancellationToken,
    ) -> TenantiqResult<Vec<Tenant>> {
        let mut filter = filter;
        if filter.limit > self.config.max_list_limit {
            debug!(
                requested = filter.limit,
                max = self.config.max_list_limit,
                "Clamping list limit"
            );
            filter.limit = self.config.max_list_limit;
        }
        race(cancel, self.repo.list(&filter)).await
    }

    /// Apply `event` to the tenant and announce it.
    ///
    /// Order is load, validate, persist, publish. Nothing is written when
    /// validation fails; nothing written is undone when publishing fails.
    pub async fn transition(
        &self,
        id: &TenantId,
        event: Event,
        cancel: &CancellationToken,
    ) -> TenantiqResult<Tenant> {
        // 1. Load.
        let mut tenant = race(cancel, self.repo.get_by_id(id)).await?;
        let previous = tenant.status();

        // 2. Validate.
        let next = self.validator.apply(previous, event).inspect_err(|e| {
            debug!(tenant_id = %id, error = %e, "Transition rejected");
        })?;

        // 3. Apply and persist, conditioned on the loaded version.
        tenant.apply_transition(next);
        ensure_live(cancel)?;
        let tenant = self.repo.update(&tenant).await?;
        info!(
            tenant_id = %tenant.id,
            event = %event,
            from = %previous,
            to = %next,
            version = tenant.version,
            "Tenant transitioned"
        );

        // 4. Announce.
        self.emit(event, &tenant, cancel).await?;
        Ok(tenant)
    }

    /// Publish after a successful write. The write is never rolled back.
    async fn emit(
        &self,
        event: Event,
        tenant: &Tenant,
        cancel: &CancellationToken,
    ) -> TenantiqResult<()> {
        if cancel.is_cancelled() {
            warn!(tenant_id = %tenant.id, event = %event, "Cancelled before emission");
            return Err(TenantiqError::Publish("cancelled before emission".into()));
        }
        self.publisher.publish(event, tenant).await.inspect_err(|e| {
            warn!(
                tenant_id = %tenant.id,
                event = %event,
                error = %e,
                "Event not published; state change kept"
            );
        })
    }
}

/// Fail with [`TenantiqError::Cancelled`] if the caller already gave up.
fn ensure_live(cancel: &CancellationToken) -> TenantiqResult<()> {
    if cancel.is_cancelled() {
        return Err(TenantiqError::Cancelled);
    }
    Ok(())
}

/// Race a read against the caller's token.
async fn race<T>(
    cancel: &CancellationToken,
    read: impl Future<Output = TenantiqResult<T>>,
) -> TenantiqResult<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(TenantiqError::Cancelled),
        result = read => result,
    }
}
