//! Policy evaluation over local log files

use anyhow::Result;
use scaler_lib::policy::mean_cpu;
use scaler_lib::{MetricsSnapshot, ScalingDecision, ScalingPolicy, UtilizationSample};
use serde::Serialize;
use std::path::PathBuf;

use super::analyze::load_metrics;
use super::ensure_unique_resources;
use crate::output::{print_decision, print_json, print_metrics, print_utilization, OutputFormat};

#[derive(Serialize)]
struct Evaluation {
    blobs_read: usize,
    metrics: MetricsSnapshot,
    utilization: Vec<UtilizationSample>,
    mean_cpu_percent: Option<f64>,
    decision: ScalingDecision,
}

/// Aggregate the given log files and decide how the fleet should scale
pub async fn evaluate(
    paths: Vec<PathBuf>,
    utilization: Vec<UtilizationSample>,
    policy: ScalingPolicy,
    format: OutputFormat,
) -> Result<()> {
    ensure_unique_resources(&utilization)?;
    let (blobs_read, metrics) = load_metrics(paths).await?;
    let decision = policy.evaluate(&metrics, &utilization);
    let mean = mean_cpu(&utilization);

    match format {
        OutputFormat::Json => print_json(&Evaluation {
            blobs_read,
            metrics,
            utilization,
            mean_cpu_percent: mean,
            decision,
        })?,
        OutputFormat::Table => {
            print_metrics(&metrics, blobs_read);
            print_utilization(&utilization, mean);
            println!();
            print_decision(&decision);
        }
    }

    Ok(())
}
