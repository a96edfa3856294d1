//! Log scaler daemon
//!
//! Periodically reads application logs, evaluates the scaling policy and
//! moves the managed fleet's desired capacity by at most one instance.

use anyhow::Result;
use scaler_agent::{api, build_cycle, config::AgentConfig};
use scaler_lib::{HealthRegistry, MonitorLoop, ScalerMetrics, StructuredLogger};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting log-scaler");

    let config = AgentConfig::load()?;
    info!(
        fleet = %config.fleet_name,
        log_dir = %config.log_dir.display(),
        resources = config.resource_ids.len(),
        dry_run = config.dry_run,
        "Scaler configured"
    );

    let health_registry = HealthRegistry::with_scaler_components().await;
    let metrics = ScalerMetrics::new();

    let logger = StructuredLogger::new(&config.fleet_name);
    logger.log_startup(AGENT_VERSION, config.interval_secs);

    let monitor = MonitorLoop::new(
        build_cycle(&config, health_registry.clone()),
        config.interval(),
    );
    let app_state = Arc::new(api::AppState::new(
        health_registry,
        metrics,
        monitor.latest_report(),
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    // Let an in-flight cycle finish before exiting
    let _ = shutdown_tx.send(());
    if let Err(e) = monitor_handle.await {
        error!(error = %e, "Scaling loop panicked");
    }

    Ok(())
}
