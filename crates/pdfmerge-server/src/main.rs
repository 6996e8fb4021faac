//! pdfmerge-server - Merge uploaded PDF files over HTTP.
//!
//! Clients upload two or more PDFs, get back a download link, and fetch the
//! merged document until the link expires.

mod cli;
mod routes;
mod snapshot;

use anyhow::Context;
use clap::Parser;
use pdfmerge::clock::{Clock, SystemClock};
use pdfmerge::store::ArtifactStore;
use pdfmerge::sweeper::Sweeper;
use pdfmerge::{InMemoryStore, MergeService, ServiceConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::routes::AppState;
use crate::snapshot::SnapshotTask;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log)
        .with_context(|| format!("Invalid log filter: {}", cli.log))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    cli.validate()?;
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServiceConfig::try_from(&cli)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryStore::with_policy(
        Arc::clone(&clock),
        config.expiry_policy,
    ));

    if let Some(path) = &cli.snapshot {
        // A broken snapshot should not keep the service down
        if let Err(e) = snapshot::restore(&store, path, clock.now()) {
            warn!(op = "snapshot.restore", error = %e, "Starting with an empty store");
        }
    }

    let service = Arc::new(MergeService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.clone(),
    )?);

    let sweeper = Sweeper::spawn(Arc::clone(&store), Arc::clone(&clock), config.sweep_interval);
    let snapshots = cli
        .snapshot
        .clone()
        .map(|path| SnapshotTask::spawn(Arc::clone(&store), path, cli.snapshot_interval()));

    let app = routes::router(AppState::new(service), cli.max_upload_bytes(), cli.cors);
    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;

    info!(
        op = "server.start",
        addr = %cli.bind,
        version = pdfmerge::VERSION,
        ttl_secs = config.ttl.as_secs(),
        max_pages = config.max_pages,
        pending = store.len(),
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let swept = sweeper.shutdown().await;
    if let Some(handle) = snapshots {
        handle.shutdown().await;
    }

    info!(op = "server.stop", swept, pending = store.len(), "Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(op = "server.shutdown", "Shutdown requested");
}
