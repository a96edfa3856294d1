//! Log scaler daemon
//!
//! Wires the configured collaborators into a [`MonitorCycle`] and serves
//! health, metrics and the latest cycle report over HTTP.

pub mod api;
pub mod config;

use config::AgentConfig;
use scaler_lib::sources::{
    DirectoryBlobSource, FileFleet, FileUtilizationSource, StaticUtilizationSource,
    UtilizationSource,
};
use scaler_lib::{HealthRegistry, MonitorCycle, ScalingPolicy};
use std::sync::Arc;

/// Build the evaluation cycle described by the configuration
pub fn build_cycle(config: &AgentConfig, health: HealthRegistry) -> MonitorCycle {
    let blobs = DirectoryBlobSource::new(&config.log_dir)
        .with_prefix(&config.log_prefix)
        .with_max_blobs(config.max_blobs);

    let utilization: Arc<dyn UtilizationSource> = match &config.utilization_file {
        Some(path) => Arc::new(FileUtilizationSource::new(path)),
        None => Arc::new(StaticUtilizationSource::default()),
    };

    MonitorCycle::new(
        Arc::new(blobs),
        utilization,
        Arc::new(FileFleet::new(&config.fleet_state_file)),
        ScalingPolicy::new(config.thresholds),
        config.cycle_config(),
    )
    .with_health(health)
}
