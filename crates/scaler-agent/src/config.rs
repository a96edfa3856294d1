//! Agent configuration
//!
//! Values come from an optional file named by `SCALER_CONFIG_FILE`, overridden
//! by `SCALER_*` environment variables. Nested keys use `__`, e.g.
//! `SCALER_THRESHOLDS__CPU_HIGH=80`; `SCALER_RESOURCE_IDS` is comma separated.

use anyhow::{bail, Context, Result};
use scaler_lib::policy::ScalingThresholds;
use scaler_lib::sources::DEFAULT_MAX_BLOBS;
use scaler_lib::CycleConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional config file
pub const CONFIG_FILE_ENV: &str = "SCALER_CONFIG_FILE";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// API server port for health/metrics/report
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the application log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Only log files whose name starts with this prefix are read
    #[serde(default)]
    pub log_prefix: String,

    /// Number of most recent log files read per cycle
    #[serde(default = "default_max_blobs")]
    pub max_blobs: usize,

    /// JSON document of recent CPU utilization per resource
    #[serde(default)]
    pub utilization_file: Option<PathBuf>,

    /// Resources whose CPU utilization feeds the policy
    #[serde(default)]
    pub resource_ids: Vec<String>,

    /// JSON state file of the fleet manager
    #[serde(default = "default_fleet_state_file")]
    pub fleet_state_file: PathBuf,

    /// Fleet whose capacity is managed
    #[serde(default = "default_fleet_name")]
    pub fleet_name: String,

    /// Seconds between evaluation cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Ask the fleet manager to respect its cooldown on capacity writes
    #[serde(default = "default_honor_cooldown")]
    pub honor_cooldown: bool,

    /// Plan capacity changes without writing them
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub thresholds: ScalingThresholds,
}

fn default_api_port() -> u16 {
    8080
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_max_blobs() -> usize {
    DEFAULT_MAX_BLOBS
}

fn default_fleet_state_file() -> PathBuf {
    PathBuf::from("./fleet.json")
}

fn default_fleet_name() -> String {
    "default".to_string()
}

fn default_interval() -> u64 {
    300
}

fn default_honor_cooldown() -> bool {
    true
}

impl AgentConfig {
    /// Load configuration from the optional config file and environment
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("SCALER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("resource_ids"),
        );

        Self::build(builder)
    }

    /// Load configuration from a file only
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: AgentConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.interval_secs == 0 {
            bail!("interval_secs must be greater than zero");
        }
        if self.max_blobs == 0 {
            bail!("max_blobs must be greater than zero");
        }
        if !self.resource_ids.is_empty() && self.utilization_file.is_none() {
            bail!("resource_ids are set but no utilization_file is configured");
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            fleet_name: self.fleet_name.clone(),
            resource_ids: self.resource_ids.clone(),
            honor_cooldown: self.honor_cooldown,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let file = config_file("{}");
        let config = AgentConfig::from_file(file.path()).unwrap();

        assert_eq!(config.api_port, 8080);
        assert_eq!(config.max_blobs, 10);
        assert_eq!(config.fleet_name, "default");
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert!(config.honor_cooldown);
        assert!(!config.dry_run);
        assert_eq!(config.thresholds, ScalingThresholds::default());
    }

    #[test]
    fn test_nested_thresholds_override() {
        let file = config_file(
            r#"{
                "fleet_name": "web",
                "resource_ids": ["i-1", "i-2"],
                "utilization_file": "/var/lib/scaler/cpu.json",
                "thresholds": { "cpu_high": 85, "error_rate_high": 2.5 }
            }"#,
        );
        let config = AgentConfig::from_file(file.path()).unwrap();

        assert_eq!(config.thresholds.cpu_high, 85.0);
        assert_eq!(config.thresholds.cpu_low, 20.0);
        assert_eq!(config.thresholds.error_rate_high, 2.5);

        let cycle = config.cycle_config();
        assert_eq!(cycle.fleet_name, "web");
        assert_eq!(cycle.resource_ids, vec!["i-1", "i-2"]);
    }

    #[test]
    fn test_rejects_inverted_cpu_thresholds() {
        let file = config_file(r#"{"thresholds": {"cpu_high": 10, "cpu_low": 50}}"#);
        assert!(AgentConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_resource_ids_without_source() {
        let file = config_file(r#"{"resource_ids": ["i-1"]}"#);
        assert!(AgentConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let file = config_file(r#"{"interval_secs": 0}"#);
        assert!(AgentConfig::from_file(file.path()).is_err());
    }
}
