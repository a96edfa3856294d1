//! Evaluation cycle
//!
//! One cycle fetches log blobs, aggregates them, reads fleet utilization,
//! evaluates the policy and, for a scale decision, applies at most one
//! capacity change. Collaborators are called one at a time. Blob and
//! utilization failures degrade the cycle to whatever data is available;
//! a fleet failure only aborts the capacity update.

use crate::actuator::{plan_capacity, CapacityPlan};
use crate::aggregator::aggregate;
use crate::error::{FleetError, SourceError};
use crate::health::{components, HealthRegistry};
use crate::models::{MetricsSnapshot, ScalingDecision, UtilizationSample};
use crate::observability::{ScalerMetrics, StructuredLogger};
use crate::policy::{mean_cpu, ScalingPolicy};
use crate::sources::{BlobSource, FleetController, UtilizationSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

/// Settings for one fleet's evaluation cycle
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Fleet whose capacity is managed
    pub fleet_name: String,
    /// Resources whose CPU utilization feeds the policy; empty skips the CPU rule
    pub resource_ids: Vec<String>,
    /// Passed through to the fleet manager on capacity writes
    pub honor_cooldown: bool,
    /// Plan capacity changes without writing them
    pub dry_run: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            fleet_name: "default".to_string(),
            resource_ids: Vec::new(),
            honor_cooldown: true,
            dry_run: false,
        }
    }
}

/// What happened at the capacity update step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActuationOutcome {
    /// Maintain decision; the fleet manager was not contacted
    Skipped,
    /// The fleet is at the limit the decision pushes against
    NoAction { plan: CapacityPlan },
    /// A change was planned but not written
    DryRun { plan: CapacityPlan },
    /// The change was written to the fleet manager
    Applied { plan: CapacityPlan },
    /// Reading or writing the fleet failed
    Failed { error: String },
}

/// Everything one cycle observed and decided
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub fleet: String,
    pub generated_at: i64,
    pub duration_ms: u64,
    pub blobs_read: usize,
    pub metrics: MetricsSnapshot,
    pub utilization: Vec<UtilizationSample>,
    pub mean_cpu_percent: Option<f64>,
    pub decision: ScalingDecision,
    pub actuation: ActuationOutcome,
}

/// Runs evaluation cycles against a set of collaborators
pub struct MonitorCycle {
    blobs: Arc<dyn BlobSource>,
    utilization: Arc<dyn UtilizationSource>,
    fleet: Arc<dyn FleetController>,
    policy: ScalingPolicy,
    config: CycleConfig,
    health: Option<HealthRegistry>,
    metrics: ScalerMetrics,
    logger: StructuredLogger,
}

impl MonitorCycle {
    pub fn new(
        blobs: Arc<dyn BlobSource>,
        utilization: Arc<dyn UtilizationSource>,
        fleet: Arc<dyn FleetController>,
        policy: ScalingPolicy,
        config: CycleConfig,
    ) -> Self {
        let logger = StructuredLogger::new(&config.fleet_name);
        Self {
            blobs,
            utilization,
            fleet,
            policy,
            config,
            health: None,
            metrics: ScalerMetrics::new(),
            logger,
        }
    }

    /// Report collaborator health to a registry after every cycle
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Run one complete cycle
    pub async fn run_once(&self) -> CycleReport {
        let started = Instant::now();

        let blobs = self.fetch_blobs().await;
        let metrics = aggregate(&blobs);
        self.logger.log_metrics_summary(&metrics, blobs.len());
        self.metrics.record_snapshot(&metrics);

        let utilization = self.fetch_utilization().await;
        let mean_cpu_percent = mean_cpu(&utilization);
        self.metrics.set_mean_cpu(mean_cpu_percent.unwrap_or(0.0));

        let decision = self.policy.evaluate(&metrics, &utilization);
        self.logger.log_decision(&decision, mean_cpu_percent);
        self.metrics.record_decision(&decision);
        self.mark(components::POLICY, None).await;

        let actuation = self.actuate(&decision).await;

        let elapsed = started.elapsed();
        self.metrics.observe_cycle_latency(elapsed.as_secs_f64());

        CycleReport {
            fleet: self.config.fleet_name.clone(),
            generated_at: chrono::Utc::now().timestamp(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            blobs_read: blobs.len(),
            metrics,
            utilization,
            mean_cpu_percent,
            decision,
            actuation,
        }
    }

    async fn fetch_blobs(&self) -> Vec<String> {
        match self.blobs.fetch().await {
            Ok(blobs) => {
                self.mark(components::BLOB_SOURCE, None).await;
                blobs
            }
            Err(e) => {
                self.source_failed(components::BLOB_SOURCE, &e).await;
                Vec::new()
            }
        }
    }

    async fn fetch_utilization(&self) -> Vec<UtilizationSample> {
        if self.config.resource_ids.is_empty() {
            return Vec::new();
        }

        match self.utilization.utilization(&self.config.resource_ids).await {
            Ok(samples) => {
                self.mark(components::UTILIZATION_SOURCE, None).await;
                samples
            }
            Err(e) => {
                self.source_failed(components::UTILIZATION_SOURCE, &e).await;
                Vec::new()
            }
        }
    }

    async fn actuate(&self, decision: &ScalingDecision) -> ActuationOutcome {
        if decision.is_maintain() {
            self.logger.log_capacity_adequate();
            self.refresh_fleet_health().await;
            return ActuationOutcome::Skipped;
        }

        let fleet_name = &self.config.fleet_name;
        let capacity = match self.fleet.read(fleet_name).await {
            Ok(capacity) => capacity,
            Err(e) => return self.fleet_failed(e).await,
        };

        let plan = plan_capacity(decision, &capacity);
        self.logger.log_capacity_plan(&plan, self.config.dry_run);

        let outcome = match plan {
            CapacityPlan::NoAction { current, .. } => {
                self.metrics.set_desired_capacity(current);
                ActuationOutcome::NoAction { plan }
            }
            CapacityPlan::Change { .. } if self.config.dry_run => ActuationOutcome::DryRun { plan },
            CapacityPlan::Change { to, .. } => {
                if let Err(e) = self
                    .fleet
                    .write(fleet_name, to, self.config.honor_cooldown)
                    .await
                {
                    return self.fleet_failed(e).await;
                }
                self.metrics.record_capacity_change(to);
                ActuationOutcome::Applied { plan }
            }
        };

        self.mark(components::FLEET, None).await;
        outcome
    }

    /// Read-only fleet check so a recovered fleet clears its failure status
    /// on cycles that do not scale
    async fn refresh_fleet_health(&self) {
        let Some(health) = &self.health else {
            return;
        };

        match self.fleet.read(&self.config.fleet_name).await {
            Ok(_) => health.set_healthy(components::FLEET).await,
            Err(e) => {
                let message = e.to_string();
                self.logger
                    .log_collaborator_unavailable(components::FLEET, &message);
                self.metrics.inc_collaborator_errors(components::FLEET);
                self.mark_fleet(&e, message).await;
            }
        }
    }

    async fn source_failed(&self, component: &str, error: &SourceError) {
        let message = error.to_string();
        self.logger.log_collaborator_unavailable(component, &message);
        self.metrics.inc_collaborator_errors(component);
        self.mark(component, Some(message)).await;
    }

    async fn fleet_failed(&self, error: FleetError) -> ActuationOutcome {
        let message = error.to_string();
        self.logger.log_actuation_failed(&message);
        self.metrics.inc_collaborator_errors(components::FLEET);
        self.metrics.inc_actuation_failures();

        self.mark_fleet(&error, message.clone()).await;
        ActuationOutcome::Failed { error: message }
    }

    async fn mark_fleet(&self, error: &FleetError, message: String) {
        if let Some(health) = &self.health {
            match error {
                FleetError::NotFound(_) | FleetError::InvalidCapacity(_) => {
                    health.set_unhealthy(components::FLEET, message).await
                }
                FleetError::Unavailable(_) => {
                    health.set_degraded(components::FLEET, message).await
                }
            }
        }
    }

    /// Record a component as healthy, or degraded with a message
    async fn mark(&self, component: &str, failure: Option<String>) {
        if let Some(health) = &self.health {
            match failure {
                Some(message) => health.set_degraded(component, message).await,
                None => health.set_healthy(component).await,
            }
        }
    }
}

/// Latest finished cycle, shared with readers such as the HTTP API
pub type SharedReport = Arc<RwLock<Option<CycleReport>>>;

/// Repeats evaluation cycles on a fixed interval until shutdown
pub struct MonitorLoop {
    cycle: MonitorCycle,
    interval: Duration,
    latest: SharedReport,
}

impl MonitorLoop {
    pub fn new(cycle: MonitorCycle, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Handle to the most recent report
    pub fn latest_report(&self) -> SharedReport {
        Arc::clone(&self.latest)
    }

    /// Run cycles until a shutdown signal arrives
    ///
    /// The first cycle starts immediately. A tick missed because a cycle ran
    /// long is delayed rather than burst.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            fleet = %self.cycle.config.fleet_name,
            "Starting scaling loop"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle_count += 1;
                    self.cycle.logger.log_cycle_started(cycle_count);

                    let report = self.cycle.run_once().await;
                    *self.latest.write().await = Some(report);

                    if cycle_count == 1 {
                        if let Some(health) = &self.cycle.health {
                            health.set_ready(true).await;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!(cycles = cycle_count, "Shutting down scaling loop");
                    break;
                }
            }
        }
    }
}
