//! Offline analysis of repeated-trial fuzzing campaigns
//!
//! This crate turns the raw per-trial logs of a fuzzing campaign into
//! cross-trial statistics ready for plotting and tabulation.
//!
//! # Overview
//!
//! The analysis supports two independent workflows:
//!
//! ## Metric Series Workflow
//!
//! Compare how metrics evolve over a campaign for several approaches:
//!
//! 1. **Bind a Schema** ([`schema::MetricSchema`]): Pick the column layout of the logs
//! 2. **Load the Experiment** ([`experiment::ExperimentLoader`]): Read every trial,
//!    choose one sampling step ([`step::StepSelector`]) and resample all trials to it
//! 3. **Select Groups** ([`experiment::Experiment::select_group`]): Trials of one
//!    approach on one benchmark
//! 4. **Aggregate** ([`aggregate::AggregateSeries`]): Mean and standard error per sample
//!
//! ## Crash Discovery Workflow
//!
//! Summarize which crashes each approach finds, how fast and how reliably:
//!
//! 1. **Scan Trial Logs** ([`crash::TrialCrashes`]): First discovery time per crash
//! 2. **Merge Trials** ([`crash::CrashCampaign`]): Mean discovery time and reliability
//!
//! # Examples
//!
//! ## Aggregating a Metric
//!
//! ```no_run
//! use fuzzstat_analysis::{
//!     aggregate::{AggregateSeries, MetricSelector},
//!     experiment::ExperimentLoader,
//!     schema::SchemaGeneration,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let generation = SchemaGeneration::Legacy;
//! let experiment = ExperimentLoader::new(generation.schema())
//!     .with_trial_bound(generation.trial_bound())
//!     .load("results/java-data")?;
//!
//! let group = experiment.select_group("zest-ant", false);
//! let selector: MetricSelector = "valid_paths".parse()?;
//! let series = AggregateSeries::from_group(experiment.schema(), &group.tables(), &selector)?;
//!
//! if let Some((mean, std_error)) = series.last() {
//!     println!("final valid paths: {mean:.1} ± {std_error:.1}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crash Table
//!
//! ```no_run
//! use fuzzstat_analysis::crash::{CrashCampaign, crash_label};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let campaign = CrashCampaign::scan("results/java-data", "zest", "ant", 30)?;
//! for (crash, summary) in campaign.summarize() {
//!     println!(
//!         "{}: {:.0} min ({:.0}%)",
//!         crash_label(&crash),
//!         summary.mean_time_minutes(),
//!         summary.reliability
//!     );
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod crash;
pub mod experiment;
pub mod schema;
pub mod step;
pub mod trial;
