use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fuzzstat_analysis::aggregate::AggregateSeries;
use serde::Serialize;

/// Aggregated series of one experiment, written for external plotting tools.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    /// Timestamp when the report was created (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Experiment root the trials were loaded from
    pub experiment: PathBuf,
    /// Schema generation used to interpret the logs
    pub schema: String,
    /// Samples per trial after resampling
    pub samples: usize,
    /// Campaign duration spanned by the samples, in minutes
    pub duration_minutes: f64,
    pub series: Vec<SeriesRecord>,
}

/// Mean and standard error of one metric for one approach on one benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesRecord {
    pub metric: String,
    pub benchmark: String,
    pub approach: String,
    pub label: String,
    pub replay: bool,
    /// Sample times in minutes, one per series entry
    pub time_minutes: Vec<f64>,
    #[serde(flatten)]
    pub series: AggregateSeries,
}
