//! Statistical utilities for fuzzing experiment analysis.
//!
//! This crate provides the small set of descriptive measures needed to summarize
//! repeated fuzzing trials:
//!
//! - **Descriptive statistics**: mean, median, population variance and standard deviation
//! - **Standard error of the mean**: spread of a cross-trial mean estimate
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use fuzzstat_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Standard error across trials
//!
//! ```
//! use fuzzstat_stats::descriptive::DescriptiveStats;
//!
//! // Final coverage of three trials
//! let stats = DescriptiveStats::new([2.0, 4.0, 6.0]).unwrap();
//! assert!((stats.std_error() - 0.9428).abs() < 1e-4);
//! ```

pub mod descriptive;
