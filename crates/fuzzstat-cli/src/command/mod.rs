use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fuzzstat_analysis::schema::SchemaGeneration;
use tracing_subscriber::EnvFilter;

use crate::schema::campaign::{ApproachConfig, Campaign, CampaignConfig};

use self::{aggregate::AggregateArg, crash_table::CrashTableArg};

mod aggregate;
mod crash_table;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// What to compute
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Aggregate plot_data metrics across trials (mean and standard error)
    Aggregate(#[clap(flatten)] AggregateArg),
    /// Summarize crash discovery time and reliability across trials
    CrashTable(#[clap(flatten)] CrashTableArg),
}

/// Campaign selection shared by all commands
#[derive(Debug, Clone, Args)]
pub(crate) struct CampaignArg {
    /// Log format generation of the experiment (legacy or extended)
    #[arg(long)]
    pub schema: SchemaGeneration,

    /// JSON campaign description overriding the generation defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Approaches to compare, NAME or NAME:replay (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub approaches: Option<Vec<ApproachConfig>>,

    /// Benchmarks to report (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub benchmarks: Option<Vec<String>>,

    /// Highest trial index of each approach/benchmark pair
    #[arg(long)]
    pub trials: Option<u32>,
}

impl CampaignArg {
    pub(crate) fn resolve(&self, metrics: Option<Vec<String>>) -> anyhow::Result<Campaign> {
        let overrides = CampaignConfig {
            approaches: self.approaches.clone(),
            benchmarks: self.benchmarks.clone(),
            metrics,
            trials: self.trials,
        };
        Campaign::resolve(self.schema, self.config.as_deref(), overrides)
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Aggregate(arg) => aggregate::run(&arg)?,
        Mode::CrashTable(arg) => crash_table::run(&arg)?,
    }
    Ok(())
}
