//! Cross-trial aggregation of metric series
//!
//! Given the trials of one group (same approach, same benchmark), computes for
//! every sample index the mean over trials and the standard error of that mean
//! (`std_dev / sqrt(trials)`, population standard deviation).
//!
//! The aggregated quantity is chosen with a [`MetricSelector`]: either one
//! schema metric, or the elementwise ratio of two metrics computed per trial
//! before aggregating.
//!
//! # Examples
//!
//! ```
//! use fuzzstat_analysis::{
//!     aggregate::{AggregateSeries, MetricSelector},
//!     schema::MetricSchema,
//!     trial::TrialTable,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = MetricSchema::new("demo", &[(0, "time"), (1, "coverage")])?;
//! let trials = [2.0, 4.0, 6.0]
//!     .map(|c| TrialTable::from_columns(vec![vec![0.0], vec![c]]))
//!     .into_iter()
//!     .collect::<Result<Vec<_>, _>>()?;
//! let group = trials.iter().collect::<Vec<_>>();
//!
//! let series = AggregateSeries::from_group(&schema, &group, &"coverage".parse()?)?;
//! assert_eq!(series.mean, [4.0]);
//! assert!((series.std_error[0] - 0.9428).abs() < 1e-4);
//! # Ok(())
//! # }
//! ```

use std::{borrow::Cow, convert::Infallible, fmt, str::FromStr};

use fuzzstat_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::{
    schema::{MetricSchema, SchemaError},
    trial::TrialTable,
};

/// Share of diverse valid inputs among all generated inputs.
const PERCENT_UPATHS: &str = "percent_upaths";

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AggregateError {
    #[display("cannot aggregate an empty trial group")]
    EmptyGroup,
    #[display("trial {trial} has {found} samples, expected {expected}")]
    ShapeMismatch {
        trial: usize,
        expected: usize,
        found: usize,
    },
    #[display("trial {trial} has no column {index} for metric '{metric}'")]
    MissingColumn {
        trial: usize,
        metric: String,
        index: usize,
    },
    #[display("metric lookup failed")]
    Schema { source: SchemaError },
}

impl From<SchemaError> for AggregateError {
    fn from(source: SchemaError) -> Self {
        Self::Schema { source }
    }
}

/// Quantity to aggregate across trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSelector {
    /// A metric column of the schema
    Metric(String),
    /// `numerator / denominator`, evaluated per trial and sample
    Ratio {
        numerator: String,
        denominator: String,
    },
}

impl MetricSelector {
    #[must_use]
    pub fn ratio(numerator: &str, denominator: &str) -> Self {
        Self::Ratio {
            numerator: numerator.to_owned(),
            denominator: denominator.to_owned(),
        }
    }

    /// `true` for ratios, whose values lie in `0..=1` for counters.
    #[must_use]
    pub fn is_ratio(&self) -> bool {
        matches!(self, Self::Ratio { .. })
    }

    /// Checks that every metric the selector refers to exists in `schema`.
    pub fn validate(&self, schema: &MetricSchema) -> Result<(), SchemaError> {
        match self {
            Self::Metric(name) => schema.index_of(name).map(drop),
            Self::Ratio {
                numerator,
                denominator,
            } => {
                schema.index_of(numerator)?;
                schema.index_of(denominator).map(drop)
            }
        }
    }

    fn series<'t>(
        &self,
        schema: &MetricSchema,
        trial: usize,
        table: &'t TrialTable,
    ) -> Result<Cow<'t, [f64]>, AggregateError> {
        match self {
            Self::Metric(name) => Ok(Cow::Borrowed(column(schema, trial, table, name)?)),
            Self::Ratio {
                numerator,
                denominator,
            } => {
                let num = column(schema, trial, table, numerator)?;
                let den = column(schema, trial, table, denominator)?;
                Ok(Cow::Owned(
                    num.iter()
                        .zip(den)
                        .map(|(n, d)| finite_or_zero(n / d))
                        .collect(),
                ))
            }
        }
    }
}

impl FromStr for MetricSelector {
    type Err = Infallible;

    /// Parses `metric`, `numerator/denominator`, or the `percent_upaths` alias.
    ///
    /// ```
    /// # use fuzzstat_analysis::aggregate::MetricSelector;
    /// let s: MetricSelector = "valid_paths/total_inputs".parse().unwrap();
    /// assert_eq!(s, MetricSelector::ratio("valid_paths", "total_inputs"));
    /// assert_eq!("percent_upaths".parse::<MetricSelector>().unwrap(), s);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PERCENT_UPATHS {
            return Ok(Self::ratio("valid_paths", "total_inputs"));
        }
        Ok(match s.split_once('/') {
            Some((numerator, denominator)) => {
                Self::ratio(numerator.trim(), denominator.trim())
            }
            None => Self::Metric(s.trim().to_owned()),
        })
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric(name) => f.write_str(name),
            Self::Ratio {
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
        }
    }
}

fn column<'t>(
    schema: &MetricSchema,
    trial: usize,
    table: &'t TrialTable,
    metric: &str,
) -> Result<&'t [f64], AggregateError> {
    let index = schema.index_of(metric)?;
    table
        .column(index)
        .ok_or_else(|| AggregateError::MissingColumn {
            trial,
            metric: metric.to_owned(),
            index,
        })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Per-sample mean and standard error across the trials of a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSeries {
    pub trials: usize,
    pub mean: Vec<f64>,
    pub std_error: Vec<f64>,
}

impl AggregateSeries {
    /// Aggregates `selector` over `group`.
    ///
    /// # Errors
    ///
    /// * [`AggregateError::EmptyGroup`] - `group` has no trials
    /// * [`AggregateError::ShapeMismatch`] - trials differ in sample count
    /// * [`AggregateError::Schema`] - a metric is not in `schema`
    /// * [`AggregateError::MissingColumn`] - a trial is narrower than the schema
    pub fn from_group(
        schema: &MetricSchema,
        group: &[&TrialTable],
        selector: &MetricSelector,
    ) -> Result<Self, AggregateError> {
        let series = group
            .iter()
            .enumerate()
            .map(|(i, table)| selector.series(schema, i, table))
            .collect::<Result<Vec<_>, _>>()?;
        let expected = series.first().ok_or(AggregateError::EmptyGroup)?.len();
        if let Some((trial, s)) = series.iter().enumerate().find(|(_, s)| s.len() != expected) {
            return Err(AggregateError::ShapeMismatch {
                trial,
                expected,
                found: s.len(),
            });
        }

        let (mean, std_error): (Vec<f64>, Vec<f64>) = (0..expected)
            .map(|sample| {
                DescriptiveStats::new(series.iter().map(|s| s[sample]))
                    .map_or((0.0, 0.0), |stats| (stats.mean, stats.std_error()))
            })
            .unzip();

        Ok(Self {
            trials: series.len(),
            mean,
            std_error,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Final sample as `(mean, std_error)`.
    #[must_use]
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.mean.last()?, *self.std_error.last()?))
    }

    /// Evenly spaced sample times from `0` to `duration`, one per sample.
    ///
    /// ```
    /// # use fuzzstat_analysis::aggregate::AggregateSeries;
    /// let series = AggregateSeries { trials: 1, mean: vec![0.0; 5], std_error: vec![0.0; 5] };
    /// assert_eq!(series.time_axis(60.0), [0.0, 15.0, 30.0, 45.0, 60.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn time_axis(&self, duration: f64) -> Vec<f64> {
        match self.len() {
            0 => vec![],
            1 => vec![0.0],
            n => (0..n)
                .map(|i| duration * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaGeneration;

    fn metric(name: &str) -> MetricSelector {
        MetricSelector::Metric(name.to_owned())
    }

    fn legacy_table(valid_paths: &[f64], total_inputs: &[f64]) -> TrialTable {
        let n = valid_paths.len();
        let mut columns = vec![vec![0.0; n]; 12];
        columns[4] = total_inputs.to_vec();
        columns[6] = valid_paths.to_vec();
        TrialTable::from_columns(columns).unwrap()
    }

    #[test]
    fn test_mean_and_std_error() {
        let schema = SchemaGeneration::Legacy.schema();
        let tables = [
            legacy_table(&[2.0, 10.0], &[1.0, 1.0]),
            legacy_table(&[4.0, 10.0], &[1.0, 1.0]),
            legacy_table(&[6.0, 10.0], &[1.0, 1.0]),
        ];
        let group = tables.iter().collect::<Vec<_>>();
        let series = AggregateSeries::from_group(schema, &group, &metric("valid_paths")).unwrap();
        assert_eq!(series.trials, 3);
        assert_eq!(series.mean, [4.0, 10.0]);
        assert!((series.std_error[0] - 0.942_809_041_582_063).abs() < 1e-12);
        assert_eq!(series.std_error[1], 0.0);
    }

    #[test]
    fn test_ratio_is_computed_per_trial() {
        let schema = SchemaGeneration::Legacy.schema();
        let tables = [
            legacy_table(&[1.0, 3.0], &[2.0, 4.0]),
            legacy_table(&[1.0, 1.0], &[4.0, 4.0]),
        ];
        let group = tables.iter().collect::<Vec<_>>();
        let series =
            AggregateSeries::from_group(schema, &group, &"percent_upaths".parse().unwrap())
                .unwrap();
        // per trial: [0.5, 0.75] and [0.25, 0.25]
        assert_eq!(series.mean, [0.375, 0.5]);
    }

    #[test]
    fn test_ratio_with_zero_denominator() {
        let schema = SchemaGeneration::Legacy.schema();
        let tables = [legacy_table(&[0.0, 5.0], &[0.0, 0.0])];
        let group = tables.iter().collect::<Vec<_>>();
        let selector: MetricSelector = "valid_paths/total_inputs".parse().unwrap();
        let series = AggregateSeries::from_group(schema, &group, &selector).unwrap();
        assert_eq!(series.mean, [0.0, 0.0]);
    }

    #[test]
    fn test_empty_group() {
        let schema = SchemaGeneration::Legacy.schema();
        let err = AggregateSeries::from_group(schema, &[], &metric("valid_paths")).unwrap_err();
        assert_eq!(err, AggregateError::EmptyGroup);
    }

    #[test]
    fn test_shape_mismatch() {
        let schema = SchemaGeneration::Legacy.schema();
        let tables = [
            legacy_table(&[1.0, 2.0], &[1.0, 1.0]),
            legacy_table(&[1.0], &[1.0]),
        ];
        let group = tables.iter().collect::<Vec<_>>();
        let err = AggregateSeries::from_group(schema, &group, &metric("valid_paths")).unwrap_err();
        assert_eq!(
            err,
            AggregateError::ShapeMismatch {
                trial: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_unknown_metric() {
        let schema = SchemaGeneration::Legacy.schema();
        let tables = [legacy_table(&[1.0], &[1.0])];
        let group = tables.iter().collect::<Vec<_>>();
        let err = AggregateSeries::from_group(schema, &group, &metric("b0")).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::Schema {
                source: SchemaError::UnknownMetric { .. }
            }
        ));
    }

    #[test]
    fn test_missing_column() {
        let schema = SchemaGeneration::Legacy.schema();
        let narrow = TrialTable::from_columns(vec![vec![0.0], vec![1.0]]).unwrap();
        let err =
            AggregateSeries::from_group(schema, &[&narrow], &metric("valid_paths")).unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn { index: 6, .. }));
    }

    #[test]
    fn test_validate() {
        let legacy = SchemaGeneration::Legacy.schema();
        let extended = SchemaGeneration::Extended.schema();
        let selector: MetricSelector = "percent_upaths".parse().unwrap();
        assert!(selector.validate(legacy).is_ok());
        assert!(selector.validate(extended).is_err());
    }

    #[test]
    fn test_selector_display_round_trip() {
        for s in ["valid_cov", "b0/num_semantic_probes"] {
            assert_eq!(s.parse::<MetricSelector>().unwrap().to_string(), s);
        }
    }
}
