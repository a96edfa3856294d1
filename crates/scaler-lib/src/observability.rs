//! Observability infrastructure for the log scaler
//!
//! Provides:
//! - Prometheus metrics (cycle latency, last cycle's request metrics, decisions, capacity)
//! - Structured JSON logging with tracing

use crate::actuator::CapacityPlan;
use crate::models::{MetricsSnapshot, ScalingDecision};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for cycle latency (in seconds)
const CYCLE_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScalerMetricsInner> = OnceLock::new();

struct ScalerMetricsInner {
    cycle_latency_seconds: Histogram,
    total_requests: IntGauge,
    error_count: IntGauge,
    slow_responses: IntGauge,
    avg_response_time_ms: Gauge,
    error_rate_percent: Gauge,
    slow_rate_percent: Gauge,
    mean_cpu_percent: Gauge,
    desired_capacity: IntGauge,
    decisions: IntCounterVec,
    capacity_changes: IntCounter,
    actuation_failures: IntCounter,
    collaborator_errors: IntCounterVec,
}

impl ScalerMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "log_scaler_cycle_latency_seconds",
                "Time spent running one evaluation cycle",
                CYCLE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            total_requests: register_int_gauge!(
                "log_scaler_total_requests",
                "Request lines counted in the last cycle"
            )
            .expect("Failed to register total_requests"),

            error_count: register_int_gauge!(
                "log_scaler_error_count",
                "Errors counted in the last cycle"
            )
            .expect("Failed to register error_count"),

            slow_responses: register_int_gauge!(
                "log_scaler_slow_responses",
                "Slow responses counted in the last cycle"
            )
            .expect("Failed to register slow_responses"),

            avg_response_time_ms: register_gauge!(
                "log_scaler_avg_response_time_ms",
                "Mean response time in the last cycle"
            )
            .expect("Failed to register avg_response_time_ms"),

            error_rate_percent: register_gauge!(
                "log_scaler_error_rate_percent",
                "Error rate in the last cycle"
            )
            .expect("Failed to register error_rate_percent"),

            slow_rate_percent: register_gauge!(
                "log_scaler_slow_rate_percent",
                "Slow response rate in the last cycle"
            )
            .expect("Failed to register slow_rate_percent"),

            mean_cpu_percent: register_gauge!(
                "log_scaler_mean_cpu_percent",
                "Mean fleet CPU utilization in the last cycle"
            )
            .expect("Failed to register mean_cpu_percent"),

            desired_capacity: register_int_gauge!(
                "log_scaler_desired_capacity",
                "Desired capacity after the last actuation"
            )
            .expect("Failed to register desired_capacity"),

            decisions: register_int_counter_vec!(
                "log_scaler_decisions_total",
                "Scaling decisions by action",
                &["action"]
            )
            .expect("Failed to register decisions_total"),

            capacity_changes: register_int_counter!(
                "log_scaler_capacity_changes_total",
                "Capacity changes written to the fleet manager"
            )
            .expect("Failed to register capacity_changes_total"),

            actuation_failures: register_int_counter!(
                "log_scaler_actuation_failures_total",
                "Cycles whose capacity update step failed"
            )
            .expect("Failed to register actuation_failures_total"),

            collaborator_errors: register_int_counter_vec!(
                "log_scaler_collaborator_errors_total",
                "Collaborator calls that failed, by collaborator",
                &["collaborator"]
            )
            .expect("Failed to register collaborator_errors_total"),
        }
    }
}

/// Scaler metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ScalerMetrics {
    _private: (),
}

impl Default for ScalerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScalerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    /// Publish the request metrics of a finished cycle
    pub fn record_snapshot(&self, snapshot: &MetricsSnapshot) {
        let inner = self.inner();
        inner.total_requests.set(clamp_i64(snapshot.total_requests));
        inner.error_count.set(clamp_i64(snapshot.error_count));
        inner.slow_responses.set(clamp_i64(snapshot.slow_response_count));
        inner.avg_response_time_ms.set(snapshot.average_response_time_ms);
        inner.error_rate_percent.set(snapshot.error_rate().unwrap_or(0.0));
        inner.slow_rate_percent.set(snapshot.slow_rate().unwrap_or(0.0));
    }

    pub fn set_mean_cpu(&self, percent: f64) {
        self.inner().mean_cpu_percent.set(percent);
    }

    pub fn record_decision(&self, decision: &ScalingDecision) {
        self.inner()
            .decisions
            .with_label_values(&[decision.as_str()])
            .inc();
    }

    pub fn record_capacity_change(&self, desired: u32) {
        self.inner().capacity_changes.inc();
        self.inner().desired_capacity.set(i64::from(desired));
    }

    pub fn set_desired_capacity(&self, desired: u32) {
        self.inner().desired_capacity.set(i64::from(desired));
    }

    pub fn inc_actuation_failures(&self) {
        self.inner().actuation_failures.inc();
    }

    pub fn inc_collaborator_errors(&self, collaborator: &str) {
        self.inner()
            .collaborator_errors
            .with_label_values(&[collaborator])
            .inc();
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Structured logger for scaler events
///
/// Keeps event names and fields consistent across the daemon and CLI.
#[derive(Clone)]
pub struct StructuredLogger {
    fleet: String,
}

impl StructuredLogger {
    pub fn new(fleet: impl Into<String>) -> Self {
        Self {
            fleet: fleet.into(),
        }
    }

    pub fn log_cycle_started(&self, cycle: u64) {
        debug!(event = "cycle_started", fleet = %self.fleet, cycle, "Starting evaluation cycle");
    }

    pub fn log_metrics_summary(&self, snapshot: &MetricsSnapshot, blobs_read: usize) {
        info!(
            event = "metrics_summary",
            fleet = %self.fleet,
            blobs_read,
            total_requests = snapshot.total_requests,
            error_count = snapshot.error_count,
            slow_responses = snapshot.slow_response_count,
            avg_response_time_ms = snapshot.average_response_time_ms,
            error_rate_percent = ?snapshot.error_rate(),
            slow_rate_percent = ?snapshot.slow_rate(),
            "Log metrics aggregated"
        );
    }

    pub fn log_decision(&self, decision: &ScalingDecision, mean_cpu: Option<f64>) {
        let reasons: Vec<String> = decision.reasons().iter().map(ToString::to_string).collect();
        info!(
            event = "scaling_decision",
            fleet = %self.fleet,
            action = %decision,
            mean_cpu_percent = ?mean_cpu,
            reasons = ?reasons,
            "Scaling decision made"
        );
    }

    pub fn log_capacity_plan(&self, plan: &CapacityPlan, dry_run: bool) {
        match plan {
            CapacityPlan::Change { from, to } => {
                info!(
                    event = "capacity_changed",
                    fleet = %self.fleet,
                    from = *from,
                    to = *to,
                    dry_run,
                    "Fleet capacity change planned"
                );
            }
            CapacityPlan::NoAction { current, reason } => {
                info!(
                    event = "capacity_unchanged",
                    fleet = %self.fleet,
                    current = *current,
                    reason = %reason,
                    "No scaling action taken"
                );
            }
        }
    }

    pub fn log_capacity_adequate(&self) {
        info!(
            event = "capacity_unchanged",
            fleet = %self.fleet,
            reason = "current capacity is adequate",
            "No scaling action needed"
        );
    }

    pub fn log_collaborator_unavailable(&self, collaborator: &str, error: &str) {
        warn!(
            event = "collaborator_unavailable",
            fleet = %self.fleet,
            collaborator = %collaborator,
            error = %error,
            "Collaborator failed, continuing with the data available"
        );
    }

    pub fn log_actuation_failed(&self, error: &str) {
        warn!(
            event = "actuation_failed",
            fleet = %self.fleet,
            error = %error,
            "Capacity update failed; metrics and decision remain valid"
        );
    }

    pub fn log_startup(&self, version: &str, interval_secs: u64) {
        info!(
            event = "agent_started",
            fleet = %self.fleet,
            agent_version = %version,
            interval_secs,
            "Log scaler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            fleet = %self.fleet,
            reason = %reason,
            "Log scaler shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScalingReason;

    #[test]
    fn test_scaler_metrics_handles_share_registry() {
        let metrics = ScalerMetrics::new();
        let clone = metrics.clone();

        metrics.observe_cycle_latency(0.01);
        metrics.record_snapshot(&MetricsSnapshot {
            total_requests: 10,
            error_count: 1,
            ..Default::default()
        });
        metrics.set_mean_cpu(42.0);
        clone.record_decision(&ScalingDecision::ScaleUp {
            reasons: vec![ScalingReason::HighCpu(90.0)],
        });
        clone.record_capacity_change(3);
        clone.inc_collaborator_errors("blob_source");
        clone.inc_actuation_failures();

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "log_scaler_decisions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("web");
        assert_eq!(logger.fleet, "web");
        logger.log_capacity_plan(&CapacityPlan::Change { from: 1, to: 2 }, true);
    }
}
