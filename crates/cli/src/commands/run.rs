//! One full evaluation cycle against a log directory and fleet state file

use anyhow::{bail, Result};
use scaler_lib::sources::{DirectoryBlobSource, FileFleet, StaticUtilizationSource};
use scaler_lib::{
    ActuationOutcome, CycleConfig, MonitorCycle, ScalingPolicy, UtilizationSample,
};
use std::path::PathBuf;
use std::sync::Arc;

use super::ensure_unique_resources;
use crate::output::{
    print_actuation, print_decision, print_json, print_metrics, print_utilization, OutputFormat,
};

/// Where the cycle reads logs and writes capacity
pub struct RunOptions {
    pub logs: PathBuf,
    pub prefix: String,
    pub max_blobs: usize,
    pub fleet_file: PathBuf,
    pub fleet: String,
    pub utilization: Vec<UtilizationSample>,
    pub dry_run: bool,
    pub honor_cooldown: bool,
}

/// Run a single cycle and report what it did
///
/// Fails after printing the report when the capacity update failed.
pub async fn run(options: RunOptions, policy: ScalingPolicy, format: OutputFormat) -> Result<()> {
    ensure_unique_resources(&options.utilization)?;

    let resource_ids = options
        .utilization
        .iter()
        .map(|s| s.resource_id.clone())
        .collect();
    let readings = options
        .utilization
        .into_iter()
        .map(|s| (s.resource_id, s.cpu_utilization_percent));

    let cycle = MonitorCycle::new(
        Arc::new(
            DirectoryBlobSource::new(options.logs)
                .with_prefix(options.prefix)
                .with_max_blobs(options.max_blobs),
        ),
        Arc::new(StaticUtilizationSource::from_pairs(readings)),
        Arc::new(FileFleet::new(options.fleet_file)),
        policy,
        CycleConfig {
            fleet_name: options.fleet,
            resource_ids,
            honor_cooldown: options.honor_cooldown,
            dry_run: options.dry_run,
        },
    );

    let report = cycle.run_once().await;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_metrics(&report.metrics, report.blobs_read);
            print_utilization(&report.utilization, report.mean_cpu_percent);
            println!();
            print_decision(&report.decision);
            print_actuation(&report.actuation);
        }
    }

    if let ActuationOutcome::Failed { error } = &report.actuation {
        bail!("capacity update for fleet '{}' failed: {}", report.fleet, error);
    }

    Ok(())
}
