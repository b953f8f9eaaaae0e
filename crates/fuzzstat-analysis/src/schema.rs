//! Metric schemas binding metric names to `plot_data` column positions
//!
//! Every fuzzer generation writes its own `plot_data` layout. A [`MetricSchema`]
//! is the fixed, bidirectional mapping between metric names and column indices
//! for one such layout. Indices need not be contiguous: some column slots are
//! reserved and carry no metric.
//!
//! Two built-in layouts exist side by side, selected through
//! [`SchemaGeneration`]. There is no default generation: the
//! caller binds a schema to every experiment it loads.
//!
//! # Examples
//!
//! ```
//! use fuzzstat_analysis::schema::SchemaGeneration;
//!
//! let schema = SchemaGeneration::Legacy.schema();
//! assert_eq!(schema.index_of("valid_paths").unwrap(), 6);
//! assert_eq!(schema.name_of(9).unwrap(), "h0_uniquePaths");
//! assert!(schema.index_of("execs_per_sec").is_err());
//! ```

use std::{collections::BTreeMap, sync::LazyLock};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("unknown metric {key} in schema '{schema}'")]
    UnknownMetric { schema: String, key: MetricKey },
    #[display("metric '{name}' registered twice in schema '{schema}'")]
    DuplicateName { schema: String, name: String },
    #[display("column {index} registered twice in schema '{schema}'")]
    DuplicateIndex { schema: String, index: usize },
}

/// The side of a failed schema lookup.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MetricKey {
    #[display("'{_0}'")]
    Name(String),
    #[display("at column {_0}")]
    Index(usize),
}

/// Bidirectional metric name / column index mapping for one log format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSchema {
    name: String,
    by_name: BTreeMap<String, usize>,
    by_index: BTreeMap<usize, String>,
}

impl MetricSchema {
    /// Builds a schema from `(column, metric)` pairs.
    ///
    /// Both the metric names and the column indices must be unique.
    ///
    /// ```
    /// # use fuzzstat_analysis::schema::MetricSchema;
    /// let schema = MetricSchema::new("custom", &[(0, "time"), (2, "coverage")]).unwrap();
    /// assert_eq!(schema.index_of("coverage").unwrap(), 2);
    /// assert!(MetricSchema::new("bad", &[(0, "time"), (0, "coverage")]).is_err());
    /// ```
    pub fn new(name: &str, entries: &[(usize, &str)]) -> Result<Self, SchemaError> {
        let mut by_name = BTreeMap::new();
        let mut by_index = BTreeMap::new();
        for &(index, metric) in entries {
            if by_name.insert(metric.to_owned(), index).is_some() {
                return Err(SchemaError::DuplicateName {
                    schema: name.to_owned(),
                    name: metric.to_owned(),
                });
            }
            if by_index.insert(index, metric.to_owned()).is_some() {
                return Err(SchemaError::DuplicateIndex {
                    schema: name.to_owned(),
                    index,
                });
            }
        }
        Ok(Self {
            name: name.to_owned(),
            by_name,
            by_index,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_of(&self, metric: &str) -> Result<usize, SchemaError> {
        self.by_name
            .get(metric)
            .copied()
            .ok_or_else(|| SchemaError::UnknownMetric {
                schema: self.name.clone(),
                key: MetricKey::Name(metric.to_owned()),
            })
    }

    pub fn name_of(&self, index: usize) -> Result<&str, SchemaError> {
        self.by_index
            .get(&index)
            .map(String::as_str)
            .ok_or_else(|| SchemaError::UnknownMetric {
                schema: self.name.clone(),
                key: MetricKey::Index(index),
            })
    }

    /// Iterates over `(column, metric)` pairs in column order.
    pub fn metrics(&self) -> impl Iterator<Item = (usize, &str)> {
        self.by_index.iter().map(|(i, n)| (*i, n.as_str()))
    }

    /// Number of columns a record must have to hold every metric.
    #[must_use]
    pub fn width(&self) -> usize {
        self.by_index.last_key_value().map_or(0, |(i, _)| i + 1)
    }
}

const LEGACY_COLUMNS: &[(usize, &str)] = &[
    (0, "unix_time"),
    (1, "unique_crashes"),
    (2, "total_cov"),
    (3, "valid_cov"),
    (4, "total_inputs"),
    (5, "valid_inputs"),
    (6, "valid_paths"),
    (7, "valid_branch_sets"),
    (9, "h0_uniquePaths"),
    (10, "h1_uniquePaths"),
    (11, "h2_uniquePaths"),
];

const EXTENDED_COLUMNS: &[(usize, &str)] = &[
    (0, "unix_time"),
    (1, "cycles_done"),
    (2, "cur_path"),
    (3, "paths_total"),
    (4, "pending_total"),
    (5, "pending_favs"),
    (6, "map_size"),
    (7, "unique_crashes"),
    (9, "unique_hangs"),
    (10, "max_depth"),
    (11, "execs_per_sec"),
    (12, "valid_inputs"),
    (13, "invalid_inputs"),
    (14, "valid_cov"),
    (15, "all_covered_probes"),
    (16, "valid_covered_probes"),
    (17, "num_coverage_probes"),
    (18, "covered_semantic_probes"),
    (19, "num_semantic_probes"),
    (20, "b0"),
    (21, "b1"),
    (22, "b2"),
];

static LEGACY: LazyLock<MetricSchema> = LazyLock::new(|| {
    MetricSchema::new("legacy", LEGACY_COLUMNS).expect("legacy column table is unique")
});

static EXTENDED: LazyLock<MetricSchema> = LazyLock::new(|| {
    MetricSchema::new("extended", EXTENDED_COLUMNS).expect("extended column table is unique")
});

/// The `plot_data` format generations this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr, derive_more::Display)]
pub enum SchemaGeneration {
    /// ~12-column layout with diverse-path counters, 30 trials per configuration
    #[display("legacy")]
    Legacy,
    /// 23-column layout with semantic probe counters, 15 trials per configuration
    #[display("extended")]
    Extended,
}

impl SchemaGeneration {
    #[must_use]
    pub fn schema(self) -> &'static MetricSchema {
        match self {
            Self::Legacy => &LEGACY,
            Self::Extended => &EXTENDED,
        }
    }

    /// Upper bound of the trial index in `{approach}-{benchmark}-{index}`.
    #[must_use]
    pub fn trial_bound(self) -> u32 {
        match self {
            Self::Legacy => 30,
            Self::Extended => 15,
        }
    }

    /// Approaches compared by default, with whether their replay variant is plotted.
    #[must_use]
    pub fn default_approaches(self) -> &'static [(&'static str, bool)] {
        match self {
            Self::Legacy => &[
                ("quickcheck", true),
                ("zest", false),
                ("rl", true),
                ("bediv-simple", false),
                ("bediv-structure", false),
            ],
            Self::Extended => &[("zest", false), ("bedivfuzz", false), ("tracking", false)],
        }
    }

    #[must_use]
    pub fn default_benchmarks(self) -> &'static [&'static str] {
        match self {
            Self::Legacy => &["ant", "maven", "closure", "rhino", "tomcat", "nashorn"],
            Self::Extended => &["ant", "rhino", "closure", "maven", "bcel"],
        }
    }

    /// Metric selectors plotted by default (see [`crate::aggregate::MetricSelector`]).
    #[must_use]
    pub fn default_metrics(self) -> &'static [&'static str] {
        match self {
            Self::Legacy => &[
                "percent_upaths",
                "valid_paths",
                "h0_uniquePaths",
                "h1_uniquePaths",
                "h2_uniquePaths",
            ],
            Self::Extended => &["valid_cov", "covered_semantic_probes", "b0", "b1", "b2"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_are_distinct() {
        let legacy = SchemaGeneration::Legacy.schema();
        let extended = SchemaGeneration::Extended.schema();
        assert_eq!(legacy.index_of("unique_crashes").unwrap(), 1);
        assert_eq!(extended.index_of("unique_crashes").unwrap(), 7);
        assert_eq!(legacy.width(), 12);
        assert_eq!(extended.width(), 23);
    }

    #[test]
    fn test_lookup_both_directions() {
        let schema = SchemaGeneration::Extended.schema();
        for (index, name) in schema.metrics() {
            assert_eq!(schema.index_of(name).unwrap(), index);
            assert_eq!(schema.name_of(index).unwrap(), name);
        }
    }

    #[test]
    fn test_reserved_column_is_unknown() {
        let schema = SchemaGeneration::Legacy.schema();
        assert_eq!(
            schema.name_of(8),
            Err(SchemaError::UnknownMetric {
                schema: "legacy".to_owned(),
                key: MetricKey::Index(8),
            })
        );
    }

    #[test]
    fn test_unknown_metric() {
        let err = SchemaGeneration::Legacy
            .schema()
            .index_of("b0")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown metric 'b0' in schema 'legacy'"
        );
        let err = SchemaGeneration::Extended.schema().name_of(30).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown metric at column 30 in schema 'extended'"
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = MetricSchema::new("dup", &[(0, "a"), (1, "a")]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName { .. }));
    }

    #[test]
    fn test_generation_from_str() {
        assert_eq!(
            "legacy".parse::<SchemaGeneration>().unwrap(),
            SchemaGeneration::Legacy
        );
        assert_eq!(
            "Extended".parse::<SchemaGeneration>().unwrap(),
            SchemaGeneration::Extended
        );
        assert!("v3".parse::<SchemaGeneration>().is_err());
    }
}
