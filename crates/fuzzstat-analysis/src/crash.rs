//! Crash discovery statistics from free-text fuzzing logs
//!
//! Each trial writes a `fuzz.log`. Lines containing [`CRASH_MARKER`] report a
//! crash discovery; their first whitespace-separated field is the discovery
//! time in milliseconds and their sixth field identifies the crash:
//!
//! ```text
//! 183021 [main] JQF Found crash: java.lang.IllegalStateException ...
//! ```
//!
//! Per trial only the first discovery of each crash is kept
//! ([`TrialCrashes`]). Across trials the first-discovery times are merged per
//! crash ([`CrashCampaign`]) into a mean discovery time and a reliability, the
//! percentage of trials that found the crash at all. A trial that never found a
//! crash contributes nothing to it: "not found" is not "found at time zero".
//!
//! Crashes whose identity contains [`NOISE_MARKER`] are caused by the fuzzer
//! exhausting its own memory and are dropped entirely.
//!
//! # Examples
//!
//! ```
//! use fuzzstat_analysis::crash::{CrashCampaign, TrialCrashes};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = "\
//! 100 [main] JQF Found crash: java.lang.NullPointerException
//! 500 [main] JQF Found crash: java.lang.NullPointerException
//! ";
//! let mut campaign = CrashCampaign::new(2);
//! campaign.add_trial(&TrialCrashes::from_log(log)?);
//! campaign.add_trial(&TrialCrashes::from_log("")?);
//!
//! let summary = &campaign.summarize()["java.lang.NullPointerException"];
//! assert_eq!(summary.mean_time_ms, 100.0);
//! assert_eq!(summary.reliability, 50.0);
//! # Ok(())
//! # }
//! ```

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use fuzzstat_stats::descriptive;
use serde::Serialize;

/// Marker of a crash discovery line.
pub const CRASH_MARKER: &str = "Found crash:";
/// Crash identities containing this are never counted.
pub const NOISE_MARKER: &str = "OutOfMemoryError";

const TIME_FIELD: usize = 0;
const ID_FIELD: usize = 5;
const LOG_FILE_NAME: &str = "fuzz.log";
const FAILURES_DIR_NAME: &str = "failures";
const LABEL_PREFIX: &str = "java.lang.";
const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("malformed crash line {line}: '{text}'")]
pub struct CrashLineError {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CrashLogError {
    #[display("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[display("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: CrashLineError,
    },
}

/// First discovery time of every crash found in one trial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialCrashes {
    pub first_seen: BTreeMap<String, u64>,
}

impl TrialCrashes {
    /// Scans log text for crash discoveries.
    ///
    /// # Errors
    ///
    /// Returns [`CrashLineError`] for a marker line without a numeric time or
    /// without a crash identity field.
    pub fn from_log(text: &str) -> Result<Self, CrashLineError> {
        let mut first_seen = BTreeMap::new();
        for (i, line) in text.lines().enumerate() {
            if !line.contains(CRASH_MARKER) {
                continue;
            }
            let malformed = || CrashLineError {
                line: i + 1,
                text: line.to_owned(),
            };
            let fields = line.split_whitespace().collect::<Vec<_>>();
            let time = fields
                .get(TIME_FIELD)
                .and_then(|t| t.parse::<u64>().ok())
                .ok_or_else(malformed)?;
            let id = *fields.get(ID_FIELD).ok_or_else(malformed)?;
            if id.contains(NOISE_MARKER) {
                continue;
            }
            first_seen
                .entry(id.to_owned())
                .and_modify(|t: &mut u64| *t = (*t).min(time))
                .or_insert(time);
        }
        Ok(Self { first_seen })
    }

    pub fn read<P>(path: P) -> Result<Self, CrashLogError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CrashLogError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_log(&text).map_err(|source| CrashLogError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Aggregated discovery statistics of one crash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrashSummary {
    /// Mean first-discovery time over the trials that found the crash
    pub mean_time_ms: f64,
    /// Percentage of all trials that found the crash
    pub reliability: f64,
    pub observed_trials: usize,
}

impl CrashSummary {
    #[must_use]
    pub fn mean_time_minutes(&self) -> f64 {
        self.mean_time_ms / MS_PER_MINUTE
    }
}

/// First-discovery times of every crash across the trials of one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashCampaign {
    total_trials: usize,
    times: BTreeMap<String, Vec<u64>>,
}

impl CrashCampaign {
    /// Creates an empty campaign; reliability is relative to `total_trials`.
    #[must_use]
    pub fn new(total_trials: usize) -> Self {
        Self {
            total_trials,
            times: BTreeMap::new(),
        }
    }

    /// Scans trials `{approach}-{benchmark}-{1..=trials}` under `root`.
    ///
    /// A trial whose `failures` directory is missing or empty found nothing and
    /// its log is not read.
    pub fn scan<P>(
        root: P,
        approach: &str,
        benchmark: &str,
        trials: u32,
    ) -> Result<Self, CrashLogError>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        let mut campaign = Self::new(trials as usize);
        for index in 1..=trials {
            let trial_dir = root.join(format!("{approach}-{benchmark}-{index}"));
            if !has_failures(&trial_dir.join(FAILURES_DIR_NAME))? {
                tracing::debug!(trial = %trial_dir.display(), "no failures recorded");
                continue;
            }
            let crashes = TrialCrashes::read(trial_dir.join(LOG_FILE_NAME))?;
            tracing::debug!(
                trial = %trial_dir.display(),
                crashes = crashes.first_seen.len(),
                "scanned crash log"
            );
            campaign.add_trial(&crashes);
        }
        Ok(campaign)
    }

    pub fn add_trial(&mut self, crashes: &TrialCrashes) {
        for (id, &time) in &crashes.first_seen {
            self.times.entry(id.clone()).or_default().push(time);
        }
    }

    #[must_use]
    pub fn total_trials(&self) -> usize {
        self.total_trials
    }

    /// First-discovery times of `crash`, one per trial that found it.
    #[must_use]
    pub fn times(&self, crash: &str) -> Option<&[u64]> {
        self.times.get(crash).map(Vec::as_slice)
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn summarize(&self) -> BTreeMap<String, CrashSummary> {
        self.times
            .iter()
            .filter_map(|(id, times)| {
                let mean_time_ms = descriptive::mean(times.iter().map(|&t| t as f64))?;
                let summary = CrashSummary {
                    mean_time_ms,
                    reliability: 100.0 * times.len() as f64 / self.total_trials as f64,
                    observed_trials: times.len(),
                };
                Some((id.clone(), summary))
            })
            .collect()
    }
}

fn has_failures(dir: &Path) -> Result<bool, CrashLogError> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CrashLogError::Read {
            path: dir.to_owned(),
            source,
        }),
    }
}

/// Short crash label: the identity with everything up to `java.lang.` removed.
///
/// ```
/// # use fuzzstat_analysis::crash::crash_label;
/// assert_eq!(crash_label("java.lang.IllegalStateException"), "IllegalStateException");
/// assert_eq!(crash_label("org.apache.ant.BuildException"), "org.apache.ant.BuildException");
/// ```
#[must_use]
pub fn crash_label(id: &str) -> &str {
    id.find(LABEL_PREFIX)
        .map_or(id, |pos| &id[pos + LABEL_PREFIX.len()..])
}
