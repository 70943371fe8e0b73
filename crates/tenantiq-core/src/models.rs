//! Domain models for Tenantiq.

pub mod tenant;
