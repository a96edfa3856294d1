//! Subcommand implementations

pub mod analyze;
pub mod evaluate;
pub mod plan;
pub mod run;

use anyhow::{anyhow, bail, Context, Result};
use scaler_lib::UtilizationSample;
use std::collections::HashSet;

/// Parse a `--cpu ID=PERCENT` argument
pub fn parse_cpu_sample(value: &str) -> Result<UtilizationSample> {
    let (id, percent) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=PERCENT, got '{}'", value))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("resource id is empty in '{}'", value));
    }

    let percent: f64 = percent
        .trim()
        .parse()
        .with_context(|| format!("invalid CPU percentage in '{}'", value))?;
    if !percent.is_finite() || percent < 0.0 {
        return Err(anyhow!("CPU percentage must be non-negative in '{}'", value));
    }

    Ok(UtilizationSample::new(id, percent))
}

/// Reject a resource given more than one `--cpu` reading
pub fn ensure_unique_resources(samples: &[UtilizationSample]) -> Result<()> {
    let mut seen = HashSet::new();
    for sample in samples {
        if !seen.insert(sample.resource_id.as_str()) {
            bail!(
                "duplicate --cpu reading for resource '{}'",
                sample.resource_id
            );
        }
    }
    Ok(())
}
