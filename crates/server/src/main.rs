//! precache worker entry point.
//!
//! Loads configuration and the build-time bundle, opens the SQLite-backed
//! stores, installs (and normally activates) the worker, then serves its
//! lifecycle events as MCP tools on stdio. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use precache_client::{FetchClient, FetchConfig, normalize_origin};
use precache_core::config::AppConfig;
use precache_core::worker::{self, StoreNames, WorkerHandle};
use precache_core::{Bundle, CacheDb, ServiceWorker, SqliteStorage};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = normalize_origin(&config.origin).context("invalid origin")?;
    let bundle = Bundle::load(&config.bundle_path)?;
    tracing::info!(
        origin = %origin,
        resources = bundle.resources.len(),
        shell = bundle.shell.len(),
        "loaded bundle"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = ServiceWorker::new(origin, bundle, SqliteStorage::new(db), Arc::clone(&network))
        .with_store_names(StoreNames::from(&config));
    let handle = worker::spawn(Arc::new(worker));

    boot(&handle, config.auto_activate).await;

    tracing::info!("Starting precache worker on stdio transport");

    let server = serve_server(handler::PrecacheServer::new(handle, network), stdio()).await?;
    server.waiting().await?;

    Ok(())
}

/// Install, then activate when the worker asked to skip waiting.
///
/// Failures are logged, not fatal: a failed install leaves the previous
/// deployment's stores serving, and a failed activation has already wiped
/// the stores so requests fall back to the network.
async fn boot(handle: &WorkerHandle, auto_activate: bool) {
    match handle.install().await {
        Ok(staged) => tracing::info!(staged, "worker installed"),
        Err(err) => {
            tracing::warn!(error = %err, "install failed; previous cache stays in service");
            return;
        }
    }

    let skip_waiting = match handle.status().await {
        Ok(status) => status.skip_waiting,
        Err(err) => {
            tracing::warn!(error = %err, "could not read worker status");
            false
        }
    };
    if !(auto_activate && skip_waiting) {
        tracing::info!("worker installed and waiting for an activate event");
        return;
    }

    match handle.activate().await {
        Ok(report) => tracing::info!(path = ?report.path, evicted = report.evicted.len(), "worker activated"),
        Err(err) => tracing::error!(error = %err, "activation failed"),
    }
}
