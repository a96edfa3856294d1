//! Capacity planning for a given decision

use anyhow::Result;
use clap::ValueEnum;
use scaler_lib::{plan_capacity, FleetCapacity, ScalingDecision};

use crate::output::{print_json, print_plan, OutputFormat};

/// Decision to plan for
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    ScaleUp,
    ScaleDown,
    Maintain,
}

impl From<DecisionArg> for ScalingDecision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::ScaleUp => ScalingDecision::ScaleUp { reasons: vec![] },
            DecisionArg::ScaleDown => ScalingDecision::ScaleDown { reasons: vec![] },
            DecisionArg::Maintain => ScalingDecision::Maintain,
        }
    }
}

/// Show the capacity a fleet would move to for `decision`
pub fn plan(
    decision: DecisionArg,
    current: u32,
    min: u32,
    max: u32,
    format: OutputFormat,
) -> Result<()> {
    let capacity = FleetCapacity::new(current, min, max)?;
    let plan = plan_capacity(&decision.into(), &capacity);

    match format {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Table => print_plan(&plan),
    }

    Ok(())
}
