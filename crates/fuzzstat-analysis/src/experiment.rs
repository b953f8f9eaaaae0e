//! Experiment loading and trial grouping
//!
//! An experiment root holds one subdirectory per trial, each containing one
//! `plot_data` log:
//!
//! ```text
//! java-data/
//! ├─ zest-ant-1/plot_data
//! ├─ zest-ant-2/plot_data
//! ├─ quickcheck-ant-1-replay/plot_data
//! └─ summary.txt            (skipped: not a trial)
//! ```
//!
//! [`ExperimentLoader::load`] reads every trial, selects one sampling step for
//! the whole experiment ([`StepSelector`]) and slices every trial with it, so
//! all tables of an [`Experiment`] have the same sample count.
//!
//! Trial directory names encode `{approach}-{benchmark}-{index}[-replay]`. The
//! name is parsed once into a [`TrialKey`]; groups are selected on the parsed
//! key, never on the raw string.
//!
//! # Examples
//!
//! ```no_run
//! use fuzzstat_analysis::{experiment::ExperimentLoader, schema::SchemaGeneration};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let generation = SchemaGeneration::Legacy;
//! let experiment = ExperimentLoader::new(generation.schema())
//!     .with_trial_bound(generation.trial_bound())
//!     .load("results/java-data")?;
//!
//! let group = experiment.select_group("zest-ant", false);
//! println!("{} trials, {} samples each", group.len(), experiment.samples());
//! # Ok(())
//! # }
//! ```

use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use crate::{
    schema::MetricSchema,
    step::{StepError, StepSelector},
    trial::{TrialError, TrialLog, TrialTable},
};

const DEFAULT_LOG_FILE_NAME: &str = "plot_data";
const REPLAY_SUFFIX: &str = "-replay";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ExperimentError {
    #[display("failed to list trials in {}", root.display())]
    ReadDir { root: PathBuf, source: io::Error },
    #[display("failed to load trial '{trial}'")]
    Trial { trial: String, source: TrialError },
    #[display("no usable sampling step for experiment {}", root.display())]
    Step { root: PathBuf, source: StepError },
}

/// Structured identity of a trial directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrialKey {
    pub approach: String,
    pub benchmark: String,
    pub index: u32,
    pub replay: bool,
}

impl TrialKey {
    /// Parses `{approach}-{benchmark}-{index}[-replay]`.
    ///
    /// The approach may itself contain `-`; the benchmark may not.
    ///
    /// ```
    /// # use fuzzstat_analysis::experiment::TrialKey;
    /// let key = TrialKey::parse("bediv-simple-rhino-12-replay").unwrap();
    /// assert_eq!(key.approach, "bediv-simple");
    /// assert_eq!(key.benchmark, "rhino");
    /// assert_eq!(key.index, 12);
    /// assert!(key.replay);
    /// assert!(TrialKey::parse("figs").is_none());
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (rest, replay) = match name.strip_suffix(REPLAY_SUFFIX) {
            Some(rest) => (rest, true),
            None => (name, false),
        };
        let (rest, index) = rest.rsplit_once('-')?;
        let index = index.parse().ok()?;
        let (approach, benchmark) = rest.rsplit_once('-')?;
        if approach.is_empty() || benchmark.is_empty() {
            return None;
        }
        Some(Self {
            approach: approach.to_owned(),
            benchmark: benchmark.to_owned(),
            index,
            replay,
        })
    }

    /// `{approach}-{benchmark}`, the name shared by all trials of one configuration.
    #[must_use]
    pub fn base_name(&self) -> String {
        format!("{}-{}", self.approach, self.benchmark)
    }
}

impl fmt::Display for TrialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.approach, self.benchmark, self.index)?;
        if self.replay {
            f.write_str(REPLAY_SUFFIX)?;
        }
        Ok(())
    }
}

/// One loaded trial.
#[derive(Debug, Clone)]
pub struct Trial {
    /// Directory name of the trial
    pub name: String,
    /// Parsed directory name, `None` if it does not follow the naming convention
    pub key: Option<TrialKey>,
    pub table: TrialTable,
}

/// Trials of one configuration, ordered by trial index.
#[derive(Debug, Clone)]
pub struct TrialGroup<'a> {
    pub base_name: String,
    pub replay: bool,
    pub trials: Vec<&'a Trial>,
}

impl<'a> TrialGroup<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    #[must_use]
    pub fn tables(&self) -> Vec<&'a TrialTable> {
        self.trials.iter().map(|t| &t.table).collect()
    }
}

/// Loads experiments with a bound metric schema.
#[derive(Debug, Clone)]
pub struct ExperimentLoader {
    schema: MetricSchema,
    selector: StepSelector,
    trial_bound: u32,
    log_file_name: String,
}

impl ExperimentLoader {
    #[must_use]
    pub fn new(schema: &MetricSchema) -> Self {
        Self {
            schema: schema.clone(),
            selector: StepSelector::default(),
            trial_bound: 30,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_owned(),
        }
    }

    /// Highest trial index that [`Experiment::select_group`] accepts.
    #[must_use]
    pub fn with_trial_bound(mut self, trial_bound: u32) -> Self {
        self.trial_bound = trial_bound;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: StepSelector) -> Self {
        self.selector = selector;
        self
    }

    #[must_use]
    pub fn with_log_file_name(mut self, name: &str) -> Self {
        name.clone_into(&mut self.log_file_name);
        self
    }

    /// Loads every trial under `root`.
    ///
    /// Any unreadable or malformed trial aborts the whole load: the sampling
    /// step depends on all of them.
    pub fn load<P>(&self, root: P) -> Result<Experiment, ExperimentError>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        let names = trial_dir_names(root)?;

        let mut logs = Vec::with_capacity(names.len());
        for name in names {
            let log = TrialLog::read(root.join(&name).join(&self.log_file_name))
                .map_err(|source| ExperimentError::Trial {
                    trial: name.clone(),
                    source,
                })?;
            tracing::debug!(trial = %name, lines = log.line_count(), "read trial log");
            logs.push((name, log));
        }

        let samples = self
            .selector
            .select(logs.iter().map(|(_, log)| log.line_count()))
            .map_err(|source| ExperimentError::Step {
                root: root.to_owned(),
                source,
            })?;
        tracing::info!(
            root = %root.display(),
            trials = logs.len(),
            samples,
            "selected sampling step"
        );

        let mut trials = BTreeMap::new();
        for (name, log) in logs {
            let table = log
                .into_table(samples)
                .map_err(|source| ExperimentError::Trial {
                    trial: name.clone(),
                    source,
                })?;
            let key = TrialKey::parse(&name);
            if key.is_none() {
                tracing::debug!(trial = %name, "trial name does not follow naming convention");
            }
            trials.insert(name.clone(), Trial { name, key, table });
        }

        Ok(Experiment {
            root: root.to_owned(),
            schema: self.schema.clone(),
            samples,
            trial_bound: self.trial_bound,
            trials,
        })
    }
}

/// Names of the trial subdirectories of `root`, sorted.
fn trial_dir_names(root: &Path) -> Result<Vec<String>, ExperimentError> {
    let read_dir_err = |source: io::Error| ExperimentError::ReadDir {
        root: root.to_owned(),
        source,
    };
    let mut names = vec![];
    for entry in fs::read_dir(root).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.contains('.') || !entry.file_type().map_err(read_dir_err)?.is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// All trials of one experiment, resampled to a common length.
#[derive(Debug, Clone)]
pub struct Experiment {
    root: PathBuf,
    schema: MetricSchema,
    samples: usize,
    trial_bound: u32,
    trials: BTreeMap<String, Trial>,
}

impl Experiment {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    /// Number of samples in every trial table.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    #[must_use]
    pub fn trial_bound(&self) -> u32 {
        self.trial_bound
    }

    pub fn trials(&self) -> impl Iterator<Item = &Trial> {
        self.trials.values()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Trial> {
        self.trials.get(name)
    }

    /// Trials named `{base_name}-{1..=N}` (or `{base_name}-{1..=N}-replay` when
    /// `replay` is set), where `N` is the trial bound.
    ///
    /// Trials outside the index range or not following the naming convention
    /// are left out.
    #[must_use]
    pub fn select_group(&self, base_name: &str, replay: bool) -> TrialGroup<'_> {
        let mut trials = self
            .trials
            .values()
            .filter_map(|trial| Some((trial.key.as_ref()?, trial)))
            .filter(|(key, _)| {
                key.replay == replay
                    && (1..=self.trial_bound).contains(&key.index)
                    && key.base_name() == base_name
            })
            .collect::<Vec<_>>();
        trials.sort_by_key(|(key, _)| key.index);
        TrialGroup {
            base_name: base_name.to_owned(),
            replay,
            trials: trials.into_iter().map(|(_, trial)| trial).collect(),
        }
    }

    #[must_use]
    pub fn select(&self, approach: &str, benchmark: &str, replay: bool) -> TrialGroup<'_> {
        self.select_group(&format!("{approach}-{benchmark}"), replay)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;
    use crate::schema::SchemaGeneration;

    fn write_trial(root: &Path, name: &str, records: usize, value: f64) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        let mut text = "# unix_time, unique_crashes, total_cov\n".to_owned();
        for i in 0..records {
            writeln!(text, "{i},0,{value}").unwrap();
        }
        fs::write(dir.join("plot_data"), text).unwrap();
    }

    fn loader() -> ExperimentLoader {
        ExperimentLoader::new(SchemaGeneration::Legacy.schema())
    }

    #[test]
    fn test_trial_key_round_trip() {
        for name in ["zest-ant-1", "quickcheck-maven-30-replay", "bediv-structure-rhino-7"] {
            assert_eq!(TrialKey::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_trial_key_rejects_bad_names() {
        for name in ["zest", "zest-ant", "zest-ant-x", "-ant-1", "figs", "zest-ant--1"] {
            assert!(TrialKey::parse(name).is_none(), "{name}");
        }
    }

    #[test]
    fn test_all_trials_share_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        write_trial(dir.path(), "zest-ant-1", 1500, 1.0);
        write_trial(dir.path(), "zest-ant-2", 999, 2.0);
        write_trial(dir.path(), "zest-ant-3", 4321, 3.0);

        let experiment = loader().load(dir.path()).unwrap();
        // shortest file has 1000 lines including header
        assert_eq!(experiment.samples(), 100);
        assert_eq!(experiment.trials().count(), 3);
        for trial in experiment.trials() {
            assert_eq!(trial.table.sample_count(), 100);
        }
    }

    #[test]
    fn test_non_trial_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_trial(dir.path(), "zest-ant-1", 100, 1.0);
        fs::create_dir(dir.path().join("figs.old")).unwrap();
        fs::write(dir.path().join("crash_table"), "not a trial").unwrap();

        let experiment = loader().load(dir.path()).unwrap();
        assert_eq!(experiment.trials().count(), 1);
        assert!(experiment.get("zest-ant-1").is_some());
    }

    #[test]
    fn test_insufficient_data_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        write_trial(dir.path(), "zest-ant-1", 500, 1.0);
        write_trial(dir.path(), "zest-ant-2", 10, 1.0);

        let err = loader().load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Step {
                source: StepError::InsufficientData { min_rows: 11 },
                ..
            }
        ));
    }

    #[test]
    fn test_empty_root_is_empty_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader().load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Step {
                source: StepError::EmptyExperiment,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_log_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        write_trial(dir.path(), "zest-ant-1", 100, 1.0);
        fs::create_dir(dir.path().join("zest-ant-2")).unwrap();

        let err = loader().load(dir.path()).unwrap_err();
        match err {
            ExperimentError::Trial { trial, source } => {
                assert_eq!(trial, "zest-ant-2");
                assert!(matches!(source, TrialError::Read { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_group_bounds() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "zest-ant-1",
            "zest-ant-2",
            "zest-ant-30",
            "zest-ant-31",
            "zest-ant-5-replay",
            "zest-ant-0",
            "zest-maven-1",
            "bediv-zest-ant-1",
            "misc",
        ] {
            write_trial(dir.path(), name, 100, 1.0);
        }

        let experiment = loader().with_trial_bound(30).load(dir.path()).unwrap();
        let group = experiment.select_group("zest-ant", false);
        let names = group
            .trials
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["zest-ant-1", "zest-ant-2", "zest-ant-30"]);

        let replay = experiment.select("zest", "ant", true);
        assert_eq!(replay.len(), 1);
        assert_eq!(replay.trials[0].name, "zest-ant-5-replay");
    }

    #[test]
    fn test_select_group_orders_by_index() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("rl-ant-10", 10.0), ("rl-ant-2", 2.0), ("rl-ant-1", 1.0)] {
            write_trial(dir.path(), name, 100, value);
        }
        let experiment = loader().load(dir.path()).unwrap();
        let group = experiment.select_group("rl-ant", false);
        let firsts = group
            .tables()
            .iter()
            .map(|t| t.column(2).unwrap()[0])
            .collect::<Vec<_>>();
        assert_eq!(firsts, [1.0, 2.0, 10.0]);
    }
}
