//! Scaling engine library for the log scaler
//!
//! This crate provides the core functionality for:
//! - Parsing request signals out of application log lines
//! - Aggregating them into per-cycle request metrics
//! - Evaluating a threshold policy into a scaling decision
//! - Planning a bounded capacity change for a fleet
//! - Running evaluation cycles against storage, utilization and fleet collaborators
//! - Health checks and observability

pub mod actuator;
pub mod aggregator;
pub mod cycle;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod parser;
pub mod policy;
pub mod sources;

pub use actuator::{plan_capacity, CapacityPlan, NoActionReason};
pub use aggregator::{aggregate, MetricsAggregator};
pub use cycle::{ActuationOutcome, CycleConfig, CycleReport, MonitorCycle, MonitorLoop};
pub use error::{CapacityError, ConfigError, FleetError, SourceError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ScalerMetrics, StructuredLogger};
pub use parser::parse_line;
pub use policy::{ScalingPolicy, ScalingThresholds};
