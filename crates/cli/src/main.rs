//! Log Scaler CLI
//!
//! A command-line tool for extracting request metrics from log files,
//! evaluating the scaling policy and running one-off scaling cycles.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{analyze, evaluate, parse_cpu_sample, plan, run};
use scaler_lib::sources::DEFAULT_MAX_BLOBS;
use scaler_lib::{ScalingPolicy, UtilizationSample};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log Scaler CLI
#[derive(Parser)]
#[command(name = "lsc")]
#[command(author, version, about = "CLI for the log-driven fleet scaler", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.config/lsc/config.json)
    #[arg(long, env = "LSC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Policy threshold overrides, in percent
#[derive(Args)]
pub struct ThresholdArgs {
    /// Mean CPU above which to scale up
    #[arg(long, global = true)]
    pub cpu_high: Option<f64>,

    /// Mean CPU below which to scale down
    #[arg(long, global = true)]
    pub cpu_low: Option<f64>,

    /// Error rate above which to scale up
    #[arg(long, global = true)]
    pub error_rate_high: Option<f64>,

    /// Slow response rate above which to scale up
    #[arg(long, global = true)]
    pub slow_rate_high: Option<f64>,
}

impl From<&ThresholdArgs> for config::ThresholdOverrides {
    fn from(args: &ThresholdArgs) -> Self {
        Self {
            cpu_high: args.cpu_high,
            cpu_low: args.cpu_low,
            error_rate_high: args.error_rate_high,
            slow_rate_high: args.slow_rate_high,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract request metrics from log files
    Analyze {
        /// Log files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Extract metrics and evaluate the scaling policy
    Evaluate {
        /// Log files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// CPU utilization of a fleet member, as ID=PERCENT (repeatable)
        #[arg(long = "cpu", value_parser = parse_cpu_arg)]
        cpu: Vec<UtilizationSample>,
    },

    /// Show the capacity change a decision would cause
    Plan {
        /// Decision to plan for
        #[arg(long, value_enum)]
        decision: plan::DecisionArg,

        /// Current desired capacity
        #[arg(long)]
        current: u32,

        /// Minimum capacity
        #[arg(long)]
        min: u32,

        /// Maximum capacity
        #[arg(long)]
        max: u32,
    },

    /// Run one full cycle against a log directory and fleet state file
    Run {
        /// Directory holding the log files
        #[arg(long)]
        logs: PathBuf,

        /// Only read files whose name starts with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Number of most recent files to read
        #[arg(long, default_value_t = DEFAULT_MAX_BLOBS)]
        max_blobs: usize,

        /// JSON fleet state file
        #[arg(long)]
        fleet_file: PathBuf,

        /// Fleet to scale
        #[arg(long, default_value = "default")]
        fleet: String,

        /// CPU utilization of a fleet member, as ID=PERCENT (repeatable)
        #[arg(long = "cpu", value_parser = parse_cpu_arg)]
        cpu: Vec<UtilizationSample>,

        /// Plan the change without writing it
        #[arg(long)]
        dry_run: bool,

        /// Ask the fleet manager to skip its cooldown
        #[arg(long)]
        ignore_cooldown: bool,
    },
}

fn parse_cpu_arg(value: &str) -> Result<UtilizationSample, String> {
    parse_cpu_sample(value).map_err(|e| format!("{:#}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(level))
        .init();

    let config = config::Config::load(cli.config.as_deref())?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let policy = ScalingPolicy::new(config.thresholds((&cli.thresholds).into())?);

    match cli.command {
        Commands::Analyze { paths } => {
            analyze::analyze(paths, format).await?;
        }
        Commands::Evaluate { paths, cpu } => {
            evaluate::evaluate(paths, cpu, policy, format).await?;
        }
        Commands::Plan {
            decision,
            current,
            min,
            max,
        } => {
            plan::plan(decision, current, min, max, format)?;
        }
        Commands::Run {
            logs,
            prefix,
            max_blobs,
            fleet_file,
            fleet,
            cpu,
            dry_run,
            ignore_cooldown,
        } => {
            let options = run::RunOptions {
                logs,
                prefix,
                max_blobs,
                fleet_file,
                fleet,
                utilization: cpu,
                dry_run,
                honor_cooldown: !ignore_cooldown,
            };
            run::run(options, policy, format).await?;
        }
    }

    Ok(())
}
