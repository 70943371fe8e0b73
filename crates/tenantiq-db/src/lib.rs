//! Tenantiq Database: SurrealDB connection management, migrations and
//! the [`TenantRepository`](tenantiq_core::repository::TenantRepository)
//! implementation.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
