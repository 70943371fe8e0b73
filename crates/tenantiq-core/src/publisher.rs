//! Event publisher port.

use crate::error::TenantiqResult;
use crate::models::tenant::{Event, Tenant};

/// Delivers lifecycle events downstream.
///
/// Delivery is at-least-once at best; consumers must tolerate
/// duplicates. The snapshot passed in is the tenant as persisted when
/// the event was raised.
pub trait EventPublisher: Send + Sync {
    fn publish(
        &self,
        event: Event,
        tenant: &Tenant,
    ) -> impl Future<Output = TenantiqResult<()>> + Send;
}
