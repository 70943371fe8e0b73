//! HTTP adapter: JSON endpoints over [`TenantService`].

use std::sync::{Arc, LazyLock};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tenantiq_core::error::{PersistenceError, TenantiqError, UnknownEvent};
use tenantiq_core::models::tenant::{Event, Status, Tenant, TenantId};
use tenantiq_core::publisher::EventPublisher;
use tenantiq_core::repository::{ListFilter, TenantRepository};
use tenantiq_core::validator::TransitionValidator;
use tenantiq_service::service::{CreateTenant, TenantService};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::error;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_NAME_CHARS: usize = 255;
const MAX_SLUG_CHARS: usize = 100;
const DEFAULT_PLAN: &str = "free";

static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern is a valid regex")
});

fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Shared handler state.
pub struct AppState<R, P, V> {
    service: Arc<TenantService<R, P, V>>,
    shutdown: CancellationToken,
}

impl<R, P, V> AppState<R, P, V> {
    /// Once `shutdown` fires, new requests are refused with 503. Requests
    /// already running finish, including their event emission.
    pub fn new(service: TenantService<R, P, V>, shutdown: CancellationToken) -> Self {
        Self {
            service: Arc::new(service),
            shutdown,
        }
    }

    /// Cancellation token for one request. It is independent of
    /// `shutdown`: a request that got past admission runs to completion,
    /// and one whose client goes away is dropped by the server.
    fn admit(&self) -> Result<CancellationToken, ApiError> {
        if self.shutdown.is_cancelled() {
            return Err(TenantiqError::Cancelled.into());
        }
        Ok(CancellationToken::new())
    }
}

impl<R, P, V> Clone for AppState<R, P, V> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            shutdown: self.shutdown.clone(),
        }
    }
}

pub fn router<R, P, V>(state: AppState<R, P, V>) -> Router
where
    R: TenantRepository + 'static,
    P: EventPublisher + 'static,
    V: TransitionValidator + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/tenants",
            post(create_tenant::<R, P, V>).get(list_tenants::<R, P, V>),
        )
        .route("/api/v1/tenants/:id", get(get_tenant::<R, P, V>))
        .route(
            "/api/v1/tenants/:id/events",
            post(transition_tenant::<R, P, V>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// -----------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub plan: Option<String>,
}

impl CreateTenantRequest {
    fn validate(self) -> Result<CreateTenant, ApiError> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_CHARS {
            return Err(ApiError::BadRequest(format!(
                "name must be 1-{MAX_NAME_CHARS} characters"
            )));
        }
        if self.slug.len() > MAX_SLUG_CHARS || !is_valid_slug(&self.slug) {
            return Err(ApiError::BadRequest(format!(
                "slug must be 1-{MAX_SLUG_CHARS} lowercase letters, digits and single hyphens"
            )));
        }
        let plan = match self.plan {
            Some(plan) if !plan.is_empty() => plan,
            _ => DEFAULT_PLAN.to_string(),
        };
        Ok(CreateTenant {
            name: self.name,
            slug: self.slug,
            plan,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub event: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListParams {
    fn into_filter(self) -> Result<ListFilter, ApiError> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<Status>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            ),
        };
        Ok(ListFilter {
            status,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub status: Status,
    pub plan: String,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            status: tenant.status(),
            id: tenant.id.to_string(),
            name: tenant.name,
            slug: tenant.slug,
            plan: tenant.plan,
            version: tenant.version,
            created_at: timestamp(tenant.created_at),
            updated_at: timestamp(tenant.updated_at),
        }
    }
}

// -----------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] TenantiqError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), false),
            ApiError::Service(err) => match err {
                TenantiqError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "tenant not found".to_string(), false)
                }
                TenantiqError::SlugConflict { .. } => (StatusCode::CONFLICT, err.to_string(), false),
                TenantiqError::Transition(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), false)
                }
                TenantiqError::Persistence(PersistenceError::Conflict { .. }) => (
                    StatusCode::CONFLICT,
                    "tenant was modified concurrently, retry the request".to_string(),
                    true,
                ),
                TenantiqError::Cancelled => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "server is shutting down".to_string(),
                    true,
                ),
                TenantiqError::Persistence(_) | TenantiqError::Publish(_) => {
                    error!(error = %err, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                        false,
                    )
                }
            },
        };
        (
            status,
            Json(json!({ "error": message, "retryable": retryable })),
        )
            .into_response()
    }
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_tenant<R, P, V>(
    State(state): State<AppState<R, P, V>>,
    body: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TenantResponse>), ApiError>
where
    R: TenantRepository,
    P: EventPublisher,
    V: TransitionValidator,
{
    let Json(body) = body?;
    let input = body.validate()?;
    let cancel = state.admit()?;
    let tenant = state.service.create(input, &cancel).await?;
    Ok((StatusCode::CREATED, Json(tenant.into())))
}

async fn get_tenant<R, P, V>(
    State(state): State<AppState<R, P, V>>,
    Path(id): Path<String>,
) -> Result<Json<TenantResponse>, ApiError>
where
    R: TenantRepository,
    P: EventPublisher,
    V: TransitionValidator,
{
    let cancel = state.admit()?;
    let tenant = state.service.get_by_id(&TenantId::new(id), &cancel).await?;
    Ok(Json(tenant.into()))
}

async fn list_tenants<R, P, V>(
    State(state): State<AppState<R, P, V>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<TenantResponse>>, ApiError>
where
    R: TenantRepository,
    P: EventPublisher,
    V: TransitionValidator,
{
    let Query(params) = params?;
    let filter = params.into_filter()?;
    let cancel = state.admit()?;
    let tenants = state.service.list(filter, &cancel).await?;
    Ok(Json(tenants.into_iter().map(TenantResponse::from).collect()))
}

async fn transition_tenant<R, P, V>(
    State(state): State<AppState<R, P, V>>,
    Path(id): Path<String>,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<TenantResponse>, ApiError>
where
    R: TenantRepository,
    P: EventPublisher,
    V: TransitionValidator,
{
    let Json(body) = body?;
    let event: Event = body
        .event
        .parse()
        .map_err(|e: UnknownEvent| ApiError::BadRequest(e.to_string()))?;
    let cancel = state.admit()?;
    let tenant = state
        .service
        .transition(&TenantId::new(id), event, &cancel)
        .await?;
    Ok(Json(tenant.into()))
}
