//! Core data models for the log scaler

use crate::error::CapacityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields extracted from a single non-empty log line
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedSignal {
    pub has_error_marker: bool,
    pub response_time_ms: Option<f64>,
    pub status_code: Option<u16>,
}

/// Request metrics aggregated over every line of one evaluation cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    /// Error markers and 5xx statuses are counted independently, so one line
    /// can add two errors and this may exceed `total_requests`.
    pub error_count: u64,
    pub slow_response_count: u64,
    pub average_response_time_ms: f64,
    /// Number of lines that carried a parsable response time
    pub response_time_samples: u64,
}

impl MetricsSnapshot {
    /// True when no request lines were seen
    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
    }

    /// Errors per hundred requests, `None` without requests
    pub fn error_rate(&self) -> Option<f64> {
        self.percent_of_requests(self.error_count)
    }

    /// Slow responses per hundred requests, `None` without requests
    pub fn slow_rate(&self) -> Option<f64> {
        self.percent_of_requests(self.slow_response_count)
    }

    fn percent_of_requests(&self, count: u64) -> Option<f64> {
        if self.total_requests == 0 {
            return None;
        }
        Some(count as f64 / self.total_requests as f64 * 100.0)
    }
}

/// Recent average CPU utilization of one fleet member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub resource_id: String,
    /// 0 when the sampling window held no data point
    pub cpu_utilization_percent: f64,
}

impl UtilizationSample {
    pub fn new(resource_id: impl Into<String>, cpu_utilization_percent: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            cpu_utilization_percent,
        }
    }
}

/// Why the policy asked for a capacity change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScalingReason {
    /// Mean CPU percent above the high threshold
    HighCpu(f64),
    /// Mean CPU percent below the low threshold
    LowCpu(f64),
    /// Error rate percent above threshold
    HighErrorRate(f64),
    /// Slow response rate percent above threshold
    HighSlowRate(f64),
}

impl ScalingReason {
    /// Whether this reason argues for more capacity
    pub fn is_scale_up(&self) -> bool {
        !matches!(self, ScalingReason::LowCpu(_))
    }
}

impl fmt::Display for ScalingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingReason::HighCpu(v) => write!(f, "High CPU utilization: {:.2}%", v),
            ScalingReason::LowCpu(v) => write!(f, "Low CPU utilization: {:.2}%", v),
            ScalingReason::HighErrorRate(v) => write!(f, "High error rate: {:.2}%", v),
            ScalingReason::HighSlowRate(v) => write!(f, "High slow response rate: {:.2}%", v),
        }
    }
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScalingDecision {
    ScaleUp { reasons: Vec<ScalingReason> },
    ScaleDown { reasons: Vec<ScalingReason> },
    Maintain,
}

impl ScalingDecision {
    /// Reasons in the order they were recorded
    pub fn reasons(&self) -> &[ScalingReason] {
        match self {
            ScalingDecision::ScaleUp { reasons } | ScalingDecision::ScaleDown { reasons } => {
                reasons
            }
            ScalingDecision::Maintain => &[],
        }
    }

    /// Stable snake_case label, used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingDecision::ScaleUp { .. } => "scale_up",
            ScalingDecision::ScaleDown { .. } => "scale_down",
            ScalingDecision::Maintain => "maintain",
        }
    }

    pub fn is_maintain(&self) -> bool {
        matches!(self, ScalingDecision::Maintain)
    }
}

impl fmt::Display for ScalingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacity limits of a fleet as reported by its manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCapacity {
    pub current: u32,
    pub min: u32,
    pub max: u32,
}

impl FleetCapacity {
    /// Build a capacity, rejecting bounds that violate `min <= current <= max`
    pub fn new(current: u32, min: u32, max: u32) -> Result<Self, CapacityError> {
        let capacity = Self { current, min, max };
        capacity.validate()?;
        Ok(capacity)
    }

    pub fn validate(&self) -> Result<(), CapacityError> {
        if self.min <= self.current && self.current <= self.max {
            Ok(())
        } else {
            Err(CapacityError::InvalidBounds {
                min: self.min,
                current: self.current,
                max: self.max,
            })
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}
