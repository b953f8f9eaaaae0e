//! Campaign description: which approaches, benchmarks and metrics to report
//!
//! A campaign starts from the defaults of its schema generation, is then
//! overridden by an optional JSON file, then by command line flags:
//!
//! ```json
//! {
//!   "approaches": [
//!     { "name": "zest" },
//!     { "name": "quickcheck", "label": "QuickCheck", "replay": true }
//!   ],
//!   "benchmarks": ["ant", "maven"],
//!   "metrics": ["valid_paths", "valid_paths/total_inputs"],
//!   "trials": 10
//! }
//! ```

use std::{path::Path, str::FromStr};

use anyhow::Context;
use fuzzstat_analysis::{aggregate::MetricSelector, schema::SchemaGeneration};
use serde::{Deserialize, Serialize};

use crate::util;

const REPLAY_FLAG: &str = "replay";

/// Partial campaign, as read from a config file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignConfig {
    #[serde(default)]
    pub approaches: Option<Vec<ApproachConfig>>,
    #[serde(default)]
    pub benchmarks: Option<Vec<String>>,
    #[serde(default)]
    pub metrics: Option<Vec<String>>,
    #[serde(default)]
    pub trials: Option<u32>,
}

/// One fuzzing approach, optionally in its replay variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApproachConfig {
    pub name: String,
    /// Display name, defaults to the well-known name of the approach
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub replay: bool,
}

impl ApproachConfig {
    #[must_use]
    pub fn new(name: &str, replay: bool) -> Self {
        Self {
            name: name.to_owned(),
            label: None,
            replay,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.label
            .as_deref()
            .unwrap_or_else(|| default_label(&self.name))
    }
}

/// Parses `name` or `name:replay`.
impl FromStr for ApproachConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if !s.is_empty() => Ok(Self::new(s, false)),
            Some((name, REPLAY_FLAG)) if !name.is_empty() => Ok(Self::new(name, true)),
            _ => Err(format!("invalid approach '{s}', expected NAME or NAME:replay")),
        }
    }
}

fn default_label(name: &str) -> &str {
    match name {
        "quickcheck" => "QuickCheck",
        "zest" => "Zest",
        "rl" => "RLCheck",
        "bediv-simple" => "BeDiv-simple",
        "bediv-structure" => "BeDiv-structure",
        "bedivfuzz" => "BeDivFuzz",
        "tracking" => "Tracking",
        _ => name,
    }
}

/// Fully resolved campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub generation: SchemaGeneration,
    pub approaches: Vec<ApproachConfig>,
    pub benchmarks: Vec<String>,
    pub metrics: Vec<MetricSelector>,
    pub trials: u32,
}

impl Campaign {
    #[must_use]
    pub fn defaults(generation: SchemaGeneration) -> Self {
        Self {
            generation,
            approaches: generation
                .default_approaches()
                .iter()
                .map(|&(name, replay)| ApproachConfig::new(name, replay))
                .collect(),
            benchmarks: generation
                .default_benchmarks()
                .iter()
                .map(|&b| b.to_owned())
                .collect(),
            metrics: generation
                .default_metrics()
                .iter()
                .map(|m| parse_metric(m))
                .collect(),
            trials: generation.trial_bound(),
        }
    }

    #[must_use]
    pub fn merge(mut self, config: CampaignConfig) -> Self {
        let CampaignConfig {
            approaches,
            benchmarks,
            metrics,
            trials,
        } = config;
        if let Some(approaches) = approaches {
            self.approaches = approaches;
        }
        if let Some(benchmarks) = benchmarks {
            self.benchmarks = benchmarks;
        }
        if let Some(metrics) = metrics {
            self.metrics = metrics.iter().map(|m| parse_metric(m)).collect();
        }
        if let Some(trials) = trials {
            self.trials = trials;
        }
        self
    }

    /// Generation defaults, overridden by `config_path`, overridden by `overrides`.
    pub fn resolve(
        generation: SchemaGeneration,
        config_path: Option<&Path>,
        overrides: CampaignConfig,
    ) -> anyhow::Result<Self> {
        let mut campaign = Self::defaults(generation);
        if let Some(path) = config_path {
            let config: CampaignConfig = util::read_json_file("campaign config", path)?;
            campaign = campaign.merge(config);
        }
        campaign = campaign.merge(overrides);

        let schema = generation.schema();
        for metric in &campaign.metrics {
            metric
                .validate(schema)
                .with_context(|| format!("metric '{metric}' cannot be computed"))?;
        }
        if campaign.trials == 0 {
            anyhow::bail!("trial count must be at least 1");
        }
        Ok(campaign)
    }
}

fn parse_metric(s: &str) -> MetricSelector {
    match s.parse() {
        Ok(selector) => selector,
        Err(never) => match never {},
    }
}
