//! Service configuration.

/// Configuration for [`TenantService`](crate::service::TenantService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound for a non-zero list limit (default: 500). A limit of
    /// `0` still means "no limit".
    pub max_list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_list_limit: 500,
        }
    }
}
