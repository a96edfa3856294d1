//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use scaler_lib::{
    ActuationOutcome, CapacityPlan, MetricsSnapshot, ScalingDecision, UtilizationSample,
};
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print the request metrics of one batch of log blobs
pub fn print_metrics(metrics: &MetricsSnapshot, blobs_read: usize) {
    println!("{}", "Log Metrics".bold());

    let mut rows = vec![
        MetricRow {
            metric: "Blobs read",
            value: blobs_read.to_string(),
        },
        MetricRow {
            metric: "Total requests",
            value: metrics.total_requests.to_string(),
        },
        MetricRow {
            metric: "Errors",
            value: metrics.error_count.to_string(),
        },
        MetricRow {
            metric: "Slow responses",
            value: metrics.slow_response_count.to_string(),
        },
        MetricRow {
            metric: "Avg response time",
            value: format!("{:.2}ms", metrics.average_response_time_ms),
        },
    ];

    if let (Some(error_rate), Some(slow_rate)) = (metrics.error_rate(), metrics.slow_rate()) {
        rows.push(MetricRow {
            metric: "Error rate",
            value: format_percent(error_rate),
        });
        rows.push(MetricRow {
            metric: "Slow rate",
            value: format_percent(slow_rate),
        });
    }

    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct UtilizationRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "CPU")]
    cpu: String,
}

/// Print per-resource CPU utilization and its mean
pub fn print_utilization(samples: &[UtilizationSample], mean: Option<f64>) {
    if samples.is_empty() {
        print_info("No CPU utilization supplied; CPU rule skipped");
        return;
    }

    let rows: Vec<UtilizationRow> = samples
        .iter()
        .map(|s| UtilizationRow {
            resource: s.resource_id.clone(),
            cpu: format_percent(s.cpu_utilization_percent),
        })
        .collect();

    println!("{}", "CPU Utilization".bold());
    println!("{}", Table::new(rows).with(Style::rounded()));
    if let Some(mean) = mean {
        println!("Mean CPU: {}", format_percent(mean).cyan());
    }
}

/// Print a scaling decision and the reasons behind it
pub fn print_decision(decision: &ScalingDecision) {
    println!("Decision: {}", color_decision(decision));
    for reason in decision.reasons() {
        println!("  - {}", reason);
    }
}

/// Print a capacity plan
pub fn print_plan(plan: &CapacityPlan) {
    match plan {
        CapacityPlan::Change { from, to } => {
            print_success(&format!("Desired capacity {} -> {}", from, to));
        }
        CapacityPlan::NoAction { current, reason } => {
            print_info(&format!("No change at capacity {}: {}", current, reason));
        }
    }
}

/// Print what happened at the capacity update step
pub fn print_actuation(outcome: &ActuationOutcome) {
    match outcome {
        ActuationOutcome::Skipped => print_info("Fleet not contacted; capacity is adequate"),
        ActuationOutcome::NoAction { plan } => print_plan(plan),
        ActuationOutcome::DryRun { plan } => {
            print_warning("Dry run; no capacity was written");
            print_plan(plan);
        }
        ActuationOutcome::Applied { plan } => print_plan(plan),
        ActuationOutcome::Failed { error } => print_error(&format!("Capacity update failed: {}", error)),
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a percentage with two decimals
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Color a decision by direction
pub fn color_decision(decision: &ScalingDecision) -> String {
    let label = decision.to_string();
    match decision {
        ScalingDecision::ScaleUp { .. } => label.red().bold().to_string(),
        ScalingDecision::ScaleDown { .. } => label.yellow().bold().to_string(),
        ScalingDecision::Maintain => label.green().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.345), "12.35%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_color_decision_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_decision(&ScalingDecision::Maintain), "maintain");
    }
}
