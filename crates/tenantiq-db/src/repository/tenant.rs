//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tenantiq_core::error::TenantiqResult;
use tenantiq_core::models::tenant::{Status, Tenant, TenantId};
use tenantiq_core::repository::{ListFilter, TenantRepository};
use tracing::debug;

use crate::error::DbError;

/// DB-side row struct for statements where the id is already known.
#[derive(Debug, SurrealValue)]
struct TenantFields {
    name: String,
    slug: String,
    status: String,
    plan: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantFields {
    fn into_row(self, record_id: String) -> TenantRow {
        TenantRow {
            record_id,
            name: self.name,
            slug: self.slug,
            status: self.status,
            plan: self.plan,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row struct returned by a version-conditioned update.
#[derive(Debug, SurrealValue)]
struct VersionRow {
    version: u64,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    name: String,
    slug: String,
    status: String,
    plan: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let status: Status = self
            .status
            .parse()
            .map_err(|e| DbError::Decode(format!("tenant {}: {e}", self.record_id)))?;
        Ok(Tenant::restore(
            TenantId::new(self.record_id),
            self.name,
            self.slug,
            status,
            self.plan,
            self.version,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn first_tenant(rows: Vec<TenantRow>, id: impl Into<String>) -> Result<Tenant, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound { id: id.into() })?
        .try_into_tenant()
}

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
                            FROM type::record('tenant', $id)";

/// SurrealDB implementation of the tenant repository.
///
/// The `idx_tenant_slug` UNIQUE index is the final word on slug
/// uniqueness; any pre-check done by callers is advisory.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_by_id(&self, id: &str) -> Result<Vec<TenantRow>, DbError> {
        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    async fn insert(&self, tenant: &Tenant) -> Result<Tenant, DbError> {
        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, status = $status, plan = $plan, \
                 version = 0, created_at = $created_at, updated_at = $updated_at",
            )
            .bind(("id", tenant.id.to_string()))
            .bind(("name", tenant.name.clone()))
            .bind(("slug", tenant.slug.clone()))
            .bind(("status", tenant.status().to_string()))
            .bind(("plan", tenant.plan.clone()))
            .bind(("created_at", tenant.created_at))
            .bind(("updated_at", tenant.updated_at))
            .await
            .map_err(|e| DbError::from_statement(e, &tenant.slug))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, &tenant.slug))?;

        let rows: Vec<TenantFields> = result.take(0)?;
        let rows = rows
            .into_iter()
            .map(|fields| fields.into_row(tenant.id.to_string()))
            .collect();
        first_tenant(rows, tenant.id.as_str())
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM tenant WHERE slug = $slug")
            .bind(("slug", slug.to_string()))
            .await?;
        let rows: Vec<TenantRow> = result.take(0)?;
        Ok(!rows.is_empty())
    }

    /// A create aborted by a concurrent transaction lost a slug race when
    /// the slug is now taken. Otherwise the caller may simply retry.
    async fn resolve_create_conflict(&self, tenant: &Tenant, message: String) -> DbError {
        match self.slug_taken(&tenant.slug).await {
            Ok(true) => {
                debug!(slug = %tenant.slug, %message, "Slug taken by concurrent create");
                DbError::DuplicateSlug {
                    slug: tenant.slug.clone(),
                }
            }
            Ok(false) => DbError::VersionConflict {
                id: tenant.id.to_string(),
            },
            Err(err) => err,
        }
    }

    /// Write `tenant` if its stored version still matches. `None` means no
    /// row matched.
    async fn write_versioned(&self, tenant: &Tenant) -> Result<Option<u64>, DbError> {
        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, status = $status, plan = $plan, \
                 updated_at = $updated_at, version = version + 1 \
                 WHERE version = $version \
                 RETURN version",
            )
            .bind(("id", tenant.id.to_string()))
            .bind(("name", tenant.name.clone()))
            .bind(("slug", tenant.slug.clone()))
            .bind(("status", tenant.status().to_string()))
            .bind(("plan", tenant.plan.clone()))
            .bind(("updated_at", tenant.updated_at))
            .bind(("version", tenant.version))
            .await
            .map_err(|e| DbError::from_statement(e, &tenant.slug))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, &tenant.slug))?;

        let rows: Vec<VersionRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.version))
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, tenant: &Tenant) -> TenantiqResult<Tenant> {
        let created = match self.insert(tenant).await {
            Ok(created) => created,
            Err(DbError::TxConflict(message)) => {
                return Err(self.resolve_create_conflict(tenant, message).await.into());
            }
            Err(err) => return Err(err.into()),
        };
        debug!(tenant_id = %created.id, slug = %created.slug, "Tenant row created");
        Ok(created)
    }

    async fn get_by_id(&self, id: &TenantId) -> TenantiqResult<Tenant> {
        let rows = self.select_by_id(id.as_str()).await?;
        Ok(first_tenant(rows, id.as_str())?)
    }

    async fn get_by_slug(&self, slug: &str) -> TenantiqResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM tenant WHERE slug = $slug",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_tenant(rows, format!("slug={slug}"))?)
    }

    async fn list(&self, filter: &ListFilter) -> TenantiqResult<Vec<Tenant>> {
        let mut query = String::from("SELECT meta::id(id) AS record_id, * FROM tenant");
        if filter.status.is_some() {
            query.push_str(" WHERE status = $status");
        }
        query.push_str(" ORDER BY created_at DESC, id DESC");
        if filter.limit > 0 {
            query.push_str(" LIMIT $limit");
        }
        if filter.offset > 0 {
            query.push_str(" START $offset");
        }

        let mut builder = self.db.query(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.to_string()));
        }
        if filter.limit > 0 {
            builder = builder.bind(("limit", filter.limit));
        }
        if filter.offset > 0 {
            builder = builder.bind(("offset", filter.offset));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;

        let tenants = rows
            .into_iter()
            .map(TenantRow::try_into_tenant)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(tenants)
    }

    async fn update(&self, tenant: &Tenant) -> TenantiqResult<Tenant> {
        let written = match self.write_versioned(tenant).await {
            Ok(written) => written,
            Err(DbError::TxConflict(message)) => {
                debug!(tenant_id = %tenant.id, %message, "Concurrent tenant write");
                return Err(DbError::VersionConflict {
                    id: tenant.id.to_string(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(version) = written {
            let mut updated = tenant.clone();
            updated.version = version;
            return Ok(updated);
        }

        // Nothing matched: either the record is gone or its version moved.
        let err = if self.select_by_id(tenant.id.as_str()).await?.is_empty() {
            DbError::NotFound {
                id: tenant.id.to_string(),
            }
        } else {
            debug!(tenant_id = %tenant.id, version = tenant.version, "Stale tenant version");
            DbError::VersionConflict {
                id: tenant.id.to_string(),
            }
        };
        Err(err.into())
    }
}
