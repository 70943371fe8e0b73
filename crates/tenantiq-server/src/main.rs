//! Tenantiq Server: application entry point.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tenantiq_core::validator::TableValidator;
use tenantiq_db::repository::SurrealTenantRepository;
use tenantiq_db::{DbManager, run_migrations};
use tenantiq_service::queue::{LoggingHandler, queue};
use tenantiq_service::{TenantService, TracingPublisher, TracingRepository};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::http::AppState;
use crate::observability::Observability;

mod config;
mod http;
mod observability;
mod shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    let observability = Observability::init(&config).context("initialising observability")?;

    info!(otel = observability.exporting(), "Starting Tenantiq server...");

    let manager = DbManager::connect(&config.db_config())
        .await
        .context("connecting to SurrealDB")?;
    let applied = run_migrations(manager.client())
        .await
        .context("running migrations")?;
    info!(applied, "Migrations complete");

    let (publisher, worker) = queue(&config.queue_config(), LoggingHandler);
    let worker_stop = CancellationToken::new();
    let worker_task = tokio::spawn(worker.run(worker_stop.clone()));

    let service = TenantService::with_config(
        TracingRepository::new(SurrealTenantRepository::new(manager.client().clone())),
        TracingPublisher::new(publisher),
        TableValidator::default(),
        config.service_config(),
    );

    let shutdown = CancellationToken::new();
    let app = http::router(AppState::new(service, shutdown.clone()));

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    let signals = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown::listen(signals).await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("serving HTTP")?;
    info!("HTTP server stopped, draining event queue");

    // In-flight requests have finished and published. The router, and
    // with it the last publisher, is gone; the worker drains and exits.
    worker_stop.cancel();
    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(timeout, worker_task).await {
        Ok(Ok(processed)) => info!(processed, "Event worker stopped"),
        Ok(Err(e)) => error!(error = %e, "Event worker panicked"),
        Err(_) => warn!(timeout_secs = config.shutdown_timeout_secs, "Event worker did not drain in time"),
    }

    info!("Tenantiq server stopped.");
    observability.shutdown();
    Ok(())
}
