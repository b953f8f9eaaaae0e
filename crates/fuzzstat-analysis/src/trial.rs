//! Loading of a single trial's `plot_data` log
//!
//! A trial log is a comma-separated text file. The first line is a header and
//! carries no data; every following line is one metric snapshot.
//!
//! Loading happens in two phases so that the experiment can pick one sampling
//! step for all of its trials before any of them is sliced:
//!
//! 1. [`TrialLog::read`] reads the raw lines and reports their count
//! 2. [`TrialLog::into_table`] down-samples to the experiment's sample count
//!    and transposes the records into a column-oriented [`TrialTable`]
//!
//! Non-finite values (`Infinity`, `-Infinity`, `NaN`, and anything else that
//! parses to a non-finite `f64`) are read as `0`. This conflates "no signal"
//! with "zero", but it is how existing campaign results have always been
//! plotted.
//!
//! # Examples
//!
//! ```no_run
//! use fuzzstat_analysis::trial::TrialLog;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = TrialLog::read("results/zest-ant-1/plot_data")?;
//! println!("{} raw lines", log.line_count());
//!
//! let table = log.into_table(100)?;
//! println!("{} samples x {} columns", table.sample_count(), table.column_count());
//! # Ok(())
//! # }
//! ```

use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
};

const FIELD_DELIMITER: char = ',';
const NON_FINITE_TOKENS: [&str; 2] = ["Infinity", "NaN"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrialError {
    #[display("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[display(
        "malformed record at {}:{line}: field '{field}' is not a number",
        path.display()
    )]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        field: String,
    },
    #[display(
        "inconsistent shape at {}:{line}: expected {expected} columns, found {found}",
        path.display()
    )]
    InconsistentShape {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[display("column {column} has {found} samples, expected {expected}")]
    RaggedColumns {
        column: usize,
        expected: usize,
        found: usize,
    },
}

/// Raw, not yet sampled lines of one trial log.
#[derive(Debug, Clone)]
pub struct TrialLog {
    path: PathBuf,
    line_count: usize,
    records: Vec<String>,
}

/// Column-oriented samples of one trial.
///
/// All columns have the same length, the experiment's sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialTable {
    columns: Vec<Vec<f64>>,
}

impl TrialLog {
    /// Reads a trial log from disk.
    pub fn read<P>(path: P) -> Result<Self, TrialError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TrialError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::from_text(path, &text))
    }

    /// Builds a trial log from already loaded text. `path` is used in diagnostics only.
    #[must_use]
    pub fn from_text(path: &Path, text: &str) -> Self {
        let mut lines = text.lines();
        let line_count = text.lines().count();
        // header
        lines.next();
        Self {
            path: path.to_owned(),
            line_count,
            records: lines.map(str::to_owned).collect(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of raw lines in the file, header included.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Number of data records, header excluded.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Down-samples to `samples` records and parses them into a table.
    ///
    /// Records are taken at a stride of `record_count / samples`, so the table
    /// holds exactly `samples` rows whenever the log has at least that many
    /// records.
    pub fn into_table(self, samples: usize) -> Result<TrialTable, TrialError> {
        let mut columns: Vec<Vec<f64>> = vec![];
        for (line, record) in downsample(&self.records, samples) {
            let values = parse_record(&self.path, line, record)?;
            if columns.is_empty() {
                columns = values.iter().map(|_| Vec::with_capacity(samples)).collect();
            } else if values.len() != columns.len() {
                return Err(TrialError::InconsistentShape {
                    path: self.path.clone(),
                    line,
                    expected: columns.len(),
                    found: values.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }
        Ok(TrialTable { columns })
    }
}

impl TrialTable {
    /// Builds a table from columns of equal length.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self, TrialError> {
        let expected = columns.first().map_or(0, Vec::len);
        if let Some((column, c)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != expected)
        {
            return Err(TrialError::RaggedColumns {
                column,
                expected,
                found: c.len(),
            });
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Replaces non-finite tokens with `0`.
///
/// ```
/// # use fuzzstat_analysis::trial::sanitize;
/// assert_eq!(sanitize("1,NaN,Infinity"), "1,0,0");
/// assert_eq!(sanitize("1,2,3"), "1,2,3");
/// ```
#[must_use]
pub fn sanitize(line: &str) -> Cow<'_, str> {
    let mut line = Cow::Borrowed(line);
    for token in NON_FINITE_TOKENS {
        if line.contains(token) {
            line = Cow::Owned(line.replace(token, "0"));
        }
    }
    line
}

/// Yields `(file line number, record)` pairs retained by down-sampling.
fn downsample(records: &[String], samples: usize) -> impl Iterator<Item = (usize, &str)> {
    let stride = (records.len() / samples.max(1)).max(1);
    records
        .iter()
        .enumerate()
        .step_by(stride)
        .take(samples)
        // +2: 1-based, header skipped
        .map(|(i, r)| (i + 2, r.as_str()))
}

fn parse_record(path: &Path, line: usize, record: &str) -> Result<Vec<f64>, TrialError> {
    sanitize(record)
        .split(FIELD_DELIMITER)
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                // `inf`, `nan` and overflowing literals still parse as non-finite
                .map(|value| if value.is_finite() { value } else { 0.0 })
                .map_err(|_| TrialError::MalformedRecord {
                    path: path.to_owned(),
                    line,
                    field: field.to_owned(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;

    fn log_with_records(n: usize) -> TrialLog {
        let mut text = "# unix_time, coverage, crashes\n".to_owned();
        for i in 0..n {
            writeln!(text, "{i},{},{}", i * 10, i % 3).unwrap();
        }
        TrialLog::from_text(Path::new("plot_data"), &text)
    }

    #[test]
    fn test_header_is_discarded() {
        let log = log_with_records(5);
        assert_eq!(log.line_count(), 6);
        assert_eq!(log.record_count(), 5);
        let table = log.into_table(5).unwrap();
        assert_eq!(table.column(0).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_downsample_yields_exact_sample_count() {
        for records in [10, 37, 100, 999, 1000, 1001] {
            let table = log_with_records(records).into_table(10).unwrap();
            assert_eq!(table.sample_count(), 10, "records = {records}");
            assert_eq!(table.column_count(), 3);
        }
    }

    #[test]
    fn test_downsample_stride() {
        let table = log_with_records(100).into_table(10).unwrap();
        let times = table.column(0).unwrap();
        assert_eq!(
            times,
            &[0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]
        );
    }

    #[test]
    fn test_non_finite_tokens_become_zero() {
        let text = "header\n1,NaN,Infinity,-Infinity\n";
        let table = TrialLog::from_text(Path::new("p"), text)
            .into_table(1)
            .unwrap();
        assert_eq!(table.column(1).unwrap(), &[0.0]);
        assert_eq!(table.column(2).unwrap(), &[0.0]);
        assert_eq!(table.column(3).unwrap(), &[0.0]);
    }

    #[test]
    fn test_other_non_finite_spellings_become_zero() {
        let text = "header\n1,inf,-inf,nan,1e999\n";
        let table = TrialLog::from_text(Path::new("p"), text)
            .into_table(1)
            .unwrap();
        for column in 1..5 {
            assert_eq!(table.column(column).unwrap(), &[0.0], "column {column}");
        }
        assert_eq!(table.column(0).unwrap(), &[1.0]);
    }

    #[test]
    fn test_malformed_record() {
        let text = "header\n1,2\n3,abc\n";
        let err = TrialLog::from_text(Path::new("p"), text)
            .into_table(2)
            .unwrap_err();
        match err {
            TrialError::MalformedRecord { line, field, .. } => {
                assert_eq!(line, 3);
                assert_eq!(field, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inconsistent_shape() {
        let text = "header\n1,2\n3,4,5\n";
        let err = TrialLog::from_text(Path::new("p"), text)
            .into_table(2)
            .unwrap_err();
        assert!(matches!(
            err,
            TrialError::InconsistentShape {
                line: 3,
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_from_columns_rejects_ragged_input() {
        let table = TrialTable::from_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(table.sample_count(), 2);
        let err = TrialTable::from_columns(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            TrialError::RaggedColumns {
                column: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrialLog::read(dir.path().join("plot_data")).unwrap_err();
        assert!(matches!(err, TrialError::Read { .. }));
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot_data");
        fs::write(&path, "h\n1,2\n3,4\n").unwrap();
        let log = TrialLog::read(&path).unwrap();
        assert_eq!(log.path(), path);
        assert_eq!(log.record_count(), 2);
    }
}
