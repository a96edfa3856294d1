//! Metrics extraction from local log files

use anyhow::Result;
use scaler_lib::sources::{BlobSource, PathBlobSource};
use scaler_lib::{aggregate, MetricsSnapshot};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::output::{print_json, print_metrics, OutputFormat};

#[derive(Serialize)]
struct Analysis {
    blobs_read: usize,
    metrics: MetricsSnapshot,
    error_rate_percent: Option<f64>,
    slow_rate_percent: Option<f64>,
}

/// Read every file under `paths` and aggregate their log lines
pub async fn load_metrics(paths: Vec<PathBuf>) -> Result<(usize, MetricsSnapshot)> {
    let blobs = PathBlobSource::new(paths).fetch().await?;
    debug!(blobs = blobs.len(), "Read log blobs");
    Ok((blobs.len(), aggregate(&blobs)))
}

/// Show the request metrics found in the given log files
pub async fn analyze(paths: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    let (blobs_read, metrics) = load_metrics(paths).await?;

    match format {
        OutputFormat::Json => print_json(&Analysis {
            blobs_read,
            error_rate_percent: metrics.error_rate(),
            slow_rate_percent: metrics.slow_rate(),
            metrics,
        })?,
        OutputFormat::Table => print_metrics(&metrics, blobs_read),
    }

    Ok(())
}
