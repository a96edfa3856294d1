//! Capacity actuation planning
//!
//! Maps a [`ScalingDecision`] onto a fleet's limits. Capacity moves by at most
//! one instance per cycle and never leaves `[min, max]`.

use crate::models::{FleetCapacity, ScalingDecision};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why no capacity change was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoActionReason {
    /// Scale up requested but the fleet is already at its maximum
    AtMaximum,
    /// Scale down requested but the fleet is already at its minimum
    AtMinimum,
    /// The decision was to maintain capacity
    NothingToDo,
}

impl fmt::Display for NoActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoActionReason::AtMaximum => write!(f, "already at maximum capacity"),
            NoActionReason::AtMinimum => write!(f, "already at minimum capacity"),
            NoActionReason::NothingToDo => write!(f, "current capacity is adequate"),
        }
    }
}

/// Desired capacity computed for one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityPlan {
    Change { from: u32, to: u32 },
    NoAction { current: u32, reason: NoActionReason },
}

impl CapacityPlan {
    /// Capacity the fleet should converge to
    pub fn target(&self) -> u32 {
        match self {
            CapacityPlan::Change { to, .. } => *to,
            CapacityPlan::NoAction { current, .. } => *current,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, CapacityPlan::Change { .. })
    }
}

/// Plan the next desired capacity for a decision
pub fn plan_capacity(decision: &ScalingDecision, capacity: &FleetCapacity) -> CapacityPlan {
    let current = capacity.current;

    match decision {
        ScalingDecision::ScaleUp { .. } if current < capacity.max => CapacityPlan::Change {
            from: current,
            to: current.saturating_add(1).min(capacity.max),
        },
        ScalingDecision::ScaleDown { .. } if current > capacity.min => CapacityPlan::Change {
            from: current,
            to: current.saturating_sub(1).max(capacity.min),
        },
        ScalingDecision::ScaleUp { .. } => CapacityPlan::NoAction {
            current,
            reason: NoActionReason::AtMaximum,
        },
        ScalingDecision::ScaleDown { .. } => CapacityPlan::NoAction {
            current,
            reason: NoActionReason::AtMinimum,
        },
        ScalingDecision::Maintain => CapacityPlan::NoAction {
            current,
            reason: NoActionReason::NothingToDo,
        },
    }
}
