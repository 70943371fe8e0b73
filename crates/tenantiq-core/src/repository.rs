//! Repository port for tenant storage.
//!
//! All operations are async. Implementations must enforce slug
//! uniqueness themselves (a unique index, not a read-then-write) and
//! must condition [`TenantRepository::update`] on the tenant's
//! `version` so that a stale write is rejected instead of silently
//! overwriting a newer one.

use crate::error::TenantiqResult;
use crate::models::tenant::{Status, Tenant, TenantId};

/// Criteria for listing tenants, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only tenants in this status.
    pub status: Option<Status>,
    /// Maximum number of rows; `0` means no limit.
    pub limit: u64,
    pub offset: u64,
}

impl ListFilter {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

pub trait TenantRepository: Send + Sync {
    /// Insert a new tenant. Fails with `SlugConflict` if the slug is
    /// taken.
    fn create(&self, tenant: &Tenant) -> impl Future<Output = TenantiqResult<Tenant>> + Send;
    fn get_by_id(&self, id: &TenantId) -> impl Future<Output = TenantiqResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = TenantiqResult<Tenant>> + Send;
    fn list(
        &self,
        filter: &ListFilter,
    ) -> impl Future<Output = TenantiqResult<Vec<Tenant>>> + Send;
    /// Write `tenant` over the stored record if the stored `version`
    /// still equals `tenant.version`; returns the stored tenant with
    /// the bumped version.
    ///
    /// Fails with `NotFound` if the record is gone and with
    /// `Persistence(Conflict)` if the version moved.
    fn update(&self, tenant: &Tenant) -> impl Future<Output = TenantiqResult<Tenant>> + Send;
}
