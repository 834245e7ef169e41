//! SLA Dashboard server
//!
//! Serves the ticket REST API, aggregate statistics, and the
//! SLA-violation prediction endpoint backed by the offline-trained
//! classifier artifacts.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use server_lib::health::components;
use server_lib::{
    ArtifactSet, ClusterReport, DashboardMetrics, HealthRegistry, SlaPredictor, StructuredLogger,
    TicketStore,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting sla-server");

    // Load configuration
    let config = config::ServerConfig::load()?;

    // Load the training artifacts; a missing file aborts startup with the
    // full listing rather than serving with a partial pipeline
    let artifacts = ArtifactSet::load(Path::new(&config.artifact_dir))
        .context("artifact validation failed, refusing to start")?;
    let holidays_loaded = artifacts.holidays.is_some();
    let clusters = artifacts
        .clusters
        .clone()
        .unwrap_or_else(ClusterReport::sample);
    let encoders = artifacts.encoders.clone();
    let importances = artifacts.importances.clone();

    let predictor =
        SlaPredictor::from_artifacts(&artifacts).context("classifier failed to load")?;
    info!(model_version = %predictor.model_version(), "Classifier loaded");

    // Open the ticket store
    let store = TicketStore::open(Path::new(&config.database_path))?;
    let ticket_count = store.ticket_count()?;
    info!(
        tickets = ticket_count,
        database = %config.database_path,
        "Ticket store opened"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::STORE).await;
    health_registry.register(components::PREDICTOR).await;
    health_registry.register(components::ARTIFACTS).await;
    if !holidays_loaded {
        health_registry
            .set_degraded(
                components::PREDICTOR,
                "holiday calendar unavailable, off-day flags are weekend-only",
            )
            .await;
    }

    // Initialize metrics
    let metrics = DashboardMetrics::new();
    metrics.set_model_version(predictor.model_version());
    metrics.set_tickets_total(ticket_count as i64);

    // Initialize structured logger
    let logger = StructuredLogger::new("sla-server");
    logger.log_startup(SERVER_VERSION, predictor.model_version(), ticket_count);

    // Create shared application state
    let app_state = Arc::new(api::AppState {
        store,
        predictor,
        encoders,
        importances,
        clusters,
        health_registry: health_registry.clone(),
        metrics,
        logger: logger.clone(),
        page_size: config.page_size,
        max_page_size: config.max_page_size,
    });

    // Mark server as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_server = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
