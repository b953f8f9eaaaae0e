//! Sampling step selection shared by all trials of an experiment
//!
//! Trials of one experiment run for the same wall-clock budget but log a
//! different number of snapshots. To compare them elementwise, every trial is
//! down-sampled to the same number of samples. The number is chosen once per
//! experiment from the shortest trial: the largest candidate step that the
//! shortest log holds at least [`StepSelector::min_samples`] times. Each trial
//! is then sliced into exactly that many samples.
//!
//! ```
//! use fuzzstat_analysis::step::{StepError, StepSelector};
//!
//! let selector = StepSelector::default();
//! assert_eq!(selector.select([1000, 1200]), Ok(100));
//! assert_eq!(selector.select([20]), Ok(2));
//! assert_eq!(selector.select([19]), Err(StepError::InsufficientData { min_rows: 19 }));
//! ```

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum StepError {
    #[display("experiment has no trial data")]
    EmptyExperiment,
    #[display("shortest trial has only {min_rows} rows, no sampling step applies")]
    InsufficientData { min_rows: usize },
}

/// Picks the sampling step for an experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSelector {
    /// Candidate steps, tried in order.
    pub candidates: Vec<usize>,
    /// Minimum `min_rows / step` a candidate must reach.
    pub min_samples: usize,
}

impl Default for StepSelector {
    fn default() -> Self {
        Self {
            candidates: vec![100, 50, 25, 10, 5, 2],
            min_samples: 10,
        }
    }
}

impl StepSelector {
    /// Selects the step from the raw line counts of every trial.
    ///
    /// # Errors
    ///
    /// * [`StepError::EmptyExperiment`] - no counts, or the shortest trial is empty
    /// * [`StepError::InsufficientData`] - no candidate leaves enough samples
    pub fn select<I>(&self, row_counts: I) -> Result<usize, StepError>
    where
        I: IntoIterator<Item = usize>,
    {
        let min_rows = row_counts
            .into_iter()
            .min()
            .filter(|&n| n > 0)
            .ok_or(StepError::EmptyExperiment)?;

        self.candidates
            .iter()
            .copied()
            .find(|&step| min_rows / step >= self.min_samples)
            .ok_or(StepError::InsufficientData { min_rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_step_wins() {
        let selector = StepSelector::default();
        assert_eq!(selector.select([1000]), Ok(100));
        assert_eq!(selector.select([999]), Ok(50));
        assert_eq!(selector.select([250, 5000]), Ok(25));
        assert_eq!(selector.select([100]), Ok(10));
        assert_eq!(selector.select([50]), Ok(5));
    }

    #[test]
    fn test_boundary_at_twenty_rows() {
        let selector = StepSelector::default();
        assert_eq!(selector.select([20, 3000]), Ok(2));
        assert_eq!(
            selector.select([19, 3000]),
            Err(StepError::InsufficientData { min_rows: 19 })
        );
    }

    #[test]
    fn test_empty_experiment() {
        let selector = StepSelector::default();
        assert_eq!(
            selector.select(std::iter::empty()),
            Err(StepError::EmptyExperiment)
        );
        assert_eq!(selector.select([0, 1000]), Err(StepError::EmptyExperiment));
    }

    #[test]
    fn test_custom_candidates() {
        let selector = StepSelector {
            candidates: vec![4, 1],
            min_samples: 2,
        };
        assert_eq!(selector.select([8]), Ok(4));
        assert_eq!(selector.select([7]), Ok(1));
    }
}
