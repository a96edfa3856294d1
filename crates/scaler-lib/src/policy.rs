//! Scaling policy evaluation
//!
//! Turns a [`MetricsSnapshot`] plus fleet CPU utilization into a single
//! [`ScalingDecision`]. Rules are evaluated in a fixed order and every rule
//! that fires contributes a reason:
//!
//! 1. mean CPU above the high threshold (up) or below the low threshold (down)
//! 2. error rate above threshold (up)
//! 3. slow response rate above threshold (up)
//!
//! Any up reason yields `ScaleUp`, even when the CPU rule voted down.

use crate::error::ConfigError;
use crate::models::{MetricsSnapshot, ScalingDecision, ScalingReason, UtilizationSample};
use serde::{Deserialize, Serialize};

/// Threshold percentages used by the policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingThresholds {
    /// Mean CPU percent above which to scale up
    #[serde(default = "default_cpu_high")]
    pub cpu_high: f64,
    /// Mean CPU percent below which to scale down
    #[serde(default = "default_cpu_low")]
    pub cpu_low: f64,
    /// Error rate percent above which to scale up
    #[serde(default = "default_error_rate_high")]
    pub error_rate_high: f64,
    /// Slow response rate percent above which to scale up
    #[serde(default = "default_slow_rate_high")]
    pub slow_rate_high: f64,
}

fn default_cpu_high() -> f64 {
    70.0
}

fn default_cpu_low() -> f64 {
    20.0
}

fn default_error_rate_high() -> f64 {
    5.0
}

fn default_slow_rate_high() -> f64 {
    10.0
}

impl Default for ScalingThresholds {
    fn default() -> Self {
        Self {
            cpu_high: default_cpu_high(),
            cpu_low: default_cpu_low(),
            error_rate_high: default_error_rate_high(),
            slow_rate_high: default_slow_rate_high(),
        }
    }
}

impl ScalingThresholds {
    /// Reject negative, non-finite or inverted CPU thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("cpu_high", self.cpu_high),
            ("cpu_low", self.cpu_low),
            ("error_rate_high", self.error_rate_high),
            ("slow_rate_high", self.slow_rate_high),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.cpu_low > self.cpu_high {
            return Err(ConfigError::InvalidThresholds(format!(
                "cpu_low ({}) exceeds cpu_high ({})",
                self.cpu_low, self.cpu_high
            )));
        }

        Ok(())
    }
}

/// Stateless threshold policy
#[derive(Debug, Clone, Default)]
pub struct ScalingPolicy {
    thresholds: ScalingThresholds,
}

impl ScalingPolicy {
    pub fn new(thresholds: ScalingThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScalingThresholds {
        &self.thresholds
    }

    /// Evaluate one cycle's metrics and utilization
    pub fn evaluate(
        &self,
        snapshot: &MetricsSnapshot,
        samples: &[UtilizationSample],
    ) -> ScalingDecision {
        let mut reasons = Vec::new();

        if let Some(avg_cpu) = mean_cpu(samples) {
            if avg_cpu > self.thresholds.cpu_high {
                reasons.push(ScalingReason::HighCpu(avg_cpu));
            } else if avg_cpu < self.thresholds.cpu_low {
                reasons.push(ScalingReason::LowCpu(avg_cpu));
            }
        }

        if let Some(error_rate) = snapshot.error_rate() {
            if error_rate > self.thresholds.error_rate_high {
                reasons.push(ScalingReason::HighErrorRate(error_rate));
            }
        }

        if let Some(slow_rate) = snapshot.slow_rate() {
            if slow_rate > self.thresholds.slow_rate_high {
                reasons.push(ScalingReason::HighSlowRate(slow_rate));
            }
        }

        if reasons.iter().any(ScalingReason::is_scale_up) {
            ScalingDecision::ScaleUp { reasons }
        } else if !reasons.is_empty() {
            ScalingDecision::ScaleDown { reasons }
        } else {
            ScalingDecision::Maintain
        }
    }
}

/// Unweighted mean CPU percent, `None` without samples
pub fn mean_cpu(samples: &[UtilizationSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|s| s.cpu_utilization_percent).sum();
    Some(sum / samples.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: u64, errors: u64, slow: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: total,
            error_count: errors,
            slow_response_count: slow,
            ..Default::default()
        }
    }

    fn cpu(values: &[f64]) -> Vec<UtilizationSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| UtilizationSample::new(format!("i-{i}"), *v))
            .collect()
    }

    #[test]
    fn test_nothing_to_go_on_maintains() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&MetricsSnapshot::default(), &[]);
        assert_eq!(decision, ScalingDecision::Maintain);
        assert!(decision.reasons().is_empty());
    }

    #[test]
    fn test_high_error_rate_alone_scales_up() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&snapshot(50, 3, 0), &[]);
        match &decision {
            ScalingDecision::ScaleUp { reasons } => {
                assert_eq!(reasons.len(), 1);
                assert!(matches!(reasons[0], ScalingReason::HighErrorRate(r) if (r - 6.0).abs() < 1e-9));
                assert_eq!(reasons[0].to_string(), "High error rate: 6.00%");
            }
            other => panic!("expected scale up, got {other:?}"),
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        let policy = ScalingPolicy::default();
        // Exactly 5% errors and 10% slow
        assert_eq!(policy.evaluate(&snapshot(100, 5, 10), &[]), ScalingDecision::Maintain);
        // Exactly at the CPU bounds
        assert_eq!(policy.evaluate(&MetricsSnapshot::default(), &cpu(&[70.0])), ScalingDecision::Maintain);
        assert_eq!(policy.evaluate(&MetricsSnapshot::default(), &cpu(&[20.0])), ScalingDecision::Maintain);
    }

    #[test]
    fn test_cpu_mean_is_unweighted() {
        assert_eq!(mean_cpu(&cpu(&[90.0, 60.0, 60.0])), Some(70.0));
        assert_eq!(mean_cpu(&[]), None);

        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&MetricsSnapshot::default(), &cpu(&[90.0, 60.0]));
        assert_eq!(
            decision,
            ScalingDecision::ScaleUp {
                reasons: vec![ScalingReason::HighCpu(75.0)]
            }
        );
    }

    #[test]
    fn test_low_cpu_scales_down() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&snapshot(100, 0, 0), &cpu(&[10.0, 5.0]));
        assert_eq!(
            decision,
            ScalingDecision::ScaleDown {
                reasons: vec![ScalingReason::LowCpu(7.5)]
            }
        );
    }

    #[test]
    fn test_missing_datapoints_pull_mean_down() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&MetricsSnapshot::default(), &cpu(&[30.0, 0.0]));
        assert!(matches!(decision, ScalingDecision::ScaleDown { .. }));
    }

    #[test]
    fn test_up_wins_over_down_and_keeps_both_reasons() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&snapshot(10, 1, 2), &cpu(&[5.0]));
        assert_eq!(
            decision,
            ScalingDecision::ScaleUp {
                reasons: vec![
                    ScalingReason::LowCpu(5.0),
                    ScalingReason::HighErrorRate(10.0),
                    ScalingReason::HighSlowRate(20.0),
                ]
            }
        );
    }

    #[test]
    fn test_error_and_slow_triggers_are_independent() {
        let policy = ScalingPolicy::default();
        let only_slow = policy.evaluate(&snapshot(10, 0, 2), &[]);
        assert_eq!(only_slow.reasons(), &[ScalingReason::HighSlowRate(20.0)]);

        let both = policy.evaluate(&snapshot(10, 1, 2), &cpu(&[95.0]));
        assert_eq!(both.reasons().len(), 3);
        assert!(both.reasons().iter().all(ScalingReason::is_scale_up));
    }

    #[test]
    fn test_double_counted_errors_can_exceed_hundred_percent() {
        let policy = ScalingPolicy::default();
        let decision = policy.evaluate(&snapshot(1, 2, 0), &[]);
        assert_eq!(decision.reasons(), &[ScalingReason::HighErrorRate(200.0)]);
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = ScalingPolicy::new(ScalingThresholds {
            cpu_high: 50.0,
            cpu_low: 10.0,
            error_rate_high: 1.0,
            slow_rate_high: 50.0,
        });
        assert!(matches!(
            policy.evaluate(&MetricsSnapshot::default(), &cpu(&[55.0])),
            ScalingDecision::ScaleUp { .. }
        ));
        assert!(matches!(
            policy.evaluate(&snapshot(100, 2, 0), &[]),
            ScalingDecision::ScaleUp { .. }
        ));
        assert_eq!(policy.evaluate(&snapshot(100, 0, 40), &[]), ScalingDecision::Maintain);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let policy = ScalingPolicy::default();
        let metrics = snapshot(40, 3, 5);
        let samples = cpu(&[15.0, 18.0]);
        let first = policy.evaluate(&metrics, &samples);
        for _ in 0..10 {
            assert_eq!(policy.evaluate(&metrics, &samples), first);
        }
    }

    #[test]
    fn test_threshold_validation() {
        assert!(ScalingThresholds::default().validate().is_ok());
        let inverted = ScalingThresholds {
            cpu_low: 80.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        let negative = ScalingThresholds {
            error_rate_high: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_thresholds_deserialize_with_defaults() {
        let thresholds: ScalingThresholds = serde_json::from_str(r#"{"cpu_high": 85}"#).unwrap();
        assert_eq!(thresholds.cpu_high, 85.0);
        assert_eq!(thresholds.cpu_low, 20.0);
        assert_eq!(thresholds.error_rate_high, 5.0);
        assert_eq!(thresholds.slow_rate_high, 10.0);
    }
}
