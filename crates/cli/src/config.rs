//! Configuration management for the CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use scaler_lib::ScalingThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default policy thresholds
    #[serde(default)]
    pub thresholds: ScalingThresholds,
    /// Default output format
    pub default_format: Option<OutputFormat>,
}

/// Threshold values given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdOverrides {
    pub cpu_high: Option<f64>,
    pub cpu_low: Option<f64>,
    pub error_rate_high: Option<f64>,
    pub slow_rate_high: Option<f64>,
}

impl Config {
    /// Load configuration from `path`, or the default location when `None`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Thresholds after applying command line overrides, validated
    pub fn thresholds(&self, overrides: ThresholdOverrides) -> Result<ScalingThresholds> {
        let base = self.thresholds;
        let thresholds = ScalingThresholds {
            cpu_high: overrides.cpu_high.unwrap_or(base.cpu_high),
            cpu_low: overrides.cpu_low.unwrap_or(base.cpu_low),
            error_rate_high: overrides.error_rate_high.unwrap_or(base.error_rate_high),
            slow_rate_high: overrides.slow_rate_high.unwrap_or(base.slow_rate_high),
        };

        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("lsc").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();

        assert_eq!(config.thresholds, ScalingThresholds::default());
        assert!(config.default_format.is_none());
    }

    #[test]
    fn test_partial_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"thresholds": {"cpu_high": 90}, "default_format": "json"}"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.default_format, Some(OutputFormat::Json));

        let thresholds = config
            .thresholds(ThresholdOverrides {
                error_rate_high: Some(1.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(thresholds.cpu_high, 90.0);
        assert_eq!(thresholds.cpu_low, 20.0);
        assert_eq!(thresholds.error_rate_high, 1.0);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = Config::default().thresholds(ThresholdOverrides {
            cpu_low: Some(95.0),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }
}
