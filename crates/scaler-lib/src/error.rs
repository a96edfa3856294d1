//! Error types for collaborators and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a read-only data source (log blobs, utilization samples)
///
/// The monitor cycle recovers from these by treating the affected data as
/// empty for that cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the fleet capacity collaborator
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("fleet not found: {0}")]
    NotFound(String),

    #[error("fleet manager unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    InvalidCapacity(#[from] CapacityError),
}

/// Fleet limits that violate `min <= current <= max`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("invalid fleet bounds: min={min} current={current} max={max}")]
    InvalidBounds { min: u32, current: u32, max: u32 },
}

/// Rejected configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),
}
