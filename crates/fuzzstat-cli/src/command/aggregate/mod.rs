//! Metric aggregation command
//!
//! Loads every trial of an experiment, resamples them to a common length and
//! reports, per metric and benchmark, the cross-trial mean and standard error
//! of each approach. The full series can be exported as JSON and CSV for
//! plotting.

mod table;

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use fuzzstat_analysis::{
    aggregate::{AggregateError, AggregateSeries, MetricSelector},
    experiment::{Experiment, ExperimentLoader},
};

use crate::{
    command::CampaignArg,
    schema::{
        campaign::Campaign,
        report::{AggregateReport, SeriesRecord},
    },
    util::{self, Output},
};

use self::table::SeriesTableRow;

#[derive(Debug, Clone, Args)]
pub(crate) struct AggregateArg {
    /// Experiment root with one subdirectory per trial
    pub experiment: PathBuf,

    #[clap(flatten)]
    pub campaign: CampaignArg,

    /// Metrics to aggregate, NAME or NUMERATOR/DENOMINATOR (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    /// Campaign duration covered by the samples, in minutes
    #[arg(long, default_value_t = 60.0)]
    pub duration_minutes: f64,

    /// Write all aggregated series to this JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Write one CSV file per metric and benchmark into this directory
    #[arg(long)]
    pub csv_dir: Option<PathBuf>,
}

pub(crate) fn run(arg: &AggregateArg) -> anyhow::Result<()> {
    let campaign = arg.campaign.resolve(arg.metrics.clone())?;
    let generation = campaign.generation;

    let experiment = ExperimentLoader::new(generation.schema())
        .with_trial_bound(campaign.trials)
        .load(&arg.experiment)
        .with_context(|| format!("Failed to load experiment {}", arg.experiment.display()))?;

    println!(
        "Aggregate Report ({generation} schema, {} trials, {} samples per trial)",
        experiment.trials().count(),
        experiment.samples()
    );
    println!("==========================================\n");

    let mut report = AggregateReport {
        generated_at: Utc::now(),
        experiment: arg.experiment.clone(),
        schema: generation.to_string(),
        samples: experiment.samples(),
        duration_minutes: arg.duration_minutes,
        series: vec![],
    };

    for metric in &campaign.metrics {
        for benchmark in &campaign.benchmarks {
            let records = aggregate_benchmark(&experiment, &campaign, metric, benchmark, arg)?;

            let rows = records
                .iter()
                .map(|r| SeriesTableRow {
                    label: r.label.clone(),
                    series: &r.series,
                })
                .collect::<Vec<_>>();
            println!("{metric} on {benchmark}");
            table::print_series_table(&rows, metric.is_ratio());
            println!();

            if let Some(dir) = &arg.csv_dir {
                save_series_csv(dir, metric, benchmark, &records)?;
            }
            report.series.extend(records);
        }
    }

    if let Some(path) = &arg.json {
        Output::save_json(&report, path.clone())?;
        println!("Aggregated series saved to: {}", path.display());
    }

    Ok(())
}

/// Aggregates `metric` for every approach of the campaign on one benchmark.
///
/// Approaches without any trial are reported and skipped.
fn aggregate_benchmark(
    experiment: &Experiment,
    campaign: &Campaign,
    metric: &MetricSelector,
    benchmark: &str,
    arg: &AggregateArg,
) -> anyhow::Result<Vec<SeriesRecord>> {
    let mut records = vec![];
    for approach in &campaign.approaches {
        let group = experiment.select(&approach.name, benchmark, approach.replay);
        let series =
            match AggregateSeries::from_group(experiment.schema(), &group.tables(), metric) {
                Ok(series) => series,
                Err(AggregateError::EmptyGroup) => {
                    tracing::warn!(
                        approach = %approach.name,
                        benchmark,
                        replay = approach.replay,
                        "no trials found, skipping"
                    );
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to aggregate {metric} for {}",
                            group.base_name
                        )
                    });
                }
            };
        tracing::debug!(group = %group.base_name, trials = series.trials, "aggregated");

        records.push(SeriesRecord {
            metric: metric.to_string(),
            benchmark: benchmark.to_owned(),
            approach: approach.name.clone(),
            label: approach.label().to_owned(),
            replay: approach.replay,
            time_minutes: series.time_axis(arg.duration_minutes),
            series,
        });
    }
    Ok(records)
}

/// Writes `time,{label}_mean,{label}_stderr,...`, one line per sample.
fn save_series_csv(
    dir: &Path,
    metric: &MetricSelector,
    benchmark: &str,
    records: &[SeriesRecord],
) -> anyhow::Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let csv_path = dir.join(format!(
        "{}_{}.csv",
        util::file_stem(&metric.to_string()),
        util::file_stem(benchmark)
    ));

    let mut csv_content = String::from("time_minutes");
    for record in records {
        write!(
            &mut csv_content,
            ",{0}_mean,{0}_stderr",
            util::file_stem(record.label.as_str())
        )?;
    }
    csv_content.push('\n');
    for (i, time) in first.time_minutes.iter().enumerate() {
        write!(&mut csv_content, "{time}")?;
        for record in records {
            write!(
                &mut csv_content,
                ",{},{}",
                record.series.mean[i], record.series.std_error[i]
            )?;
        }
        csv_content.push('\n');
    }

    fs::write(&csv_path, csv_content)
        .with_context(|| format!("Failed to write CSV file: {}", csv_path.display()))?;
    tracing::info!(path = %csv_path.display(), "series saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{f64::consts::FRAC_1_SQRT_2, fmt::Write as _};

    use fuzzstat_analysis::schema::SchemaGeneration;

    use super::*;
    use crate::schema::campaign::ApproachConfig;

    fn record(label: &str, mean: &[f64]) -> SeriesRecord {
        let series = AggregateSeries {
            trials: 2,
            mean: mean.to_vec(),
            std_error: vec![0.5; mean.len()],
        };
        SeriesRecord {
            metric: "valid_paths".to_owned(),
            benchmark: "ant".to_owned(),
            approach: label.to_lowercase(),
            label: label.to_owned(),
            replay: false,
            time_minutes: series.time_axis(60.0),
            series,
        }
    }

    #[test]
    fn test_save_series_csv() {
        let dir = tempfile::tempdir().unwrap();
        let records = [record("Zest", &[1.0, 2.0, 3.0]), record("RLCheck", &[4.0, 5.0, 6.0])];
        let metric = MetricSelector::ratio("valid_paths", "total_inputs");
        save_series_csv(dir.path(), &metric, "ant", &records).unwrap();

        let csv = fs::read_to_string(dir.path().join("valid_paths_total_inputs_ant.csv")).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            [
                "time_minutes,Zest_mean,Zest_stderr,RLCheck_mean,RLCheck_stderr",
                "0,1,0.5,4,0.5",
                "30,2,0.5,5,0.5",
                "60,3,0.5,6,0.5",
            ]
        );
    }

    #[test]
    fn test_aggregate_benchmark_skips_missing_approach() {
        let dir = tempfile::tempdir().unwrap();
        for (name, paths) in [("zest-ant-1", 2.0), ("zest-ant-2", 4.0)] {
            let trial = dir.path().join(name);
            fs::create_dir_all(&trial).unwrap();
            let mut text = "# header\n".to_owned();
            for i in 0..100 {
                writeln!(text, "{i},0,0,0,10,0,{paths},0,0,0,0,0").unwrap();
            }
            fs::write(trial.join("plot_data"), text).unwrap();
        }

        let generation = SchemaGeneration::Legacy;
        let experiment = ExperimentLoader::new(generation.schema())
            .load(dir.path())
            .unwrap();
        let mut campaign = Campaign::defaults(generation);
        campaign.approaches = vec![
            ApproachConfig::new("zest", false),
            ApproachConfig::new("rl", true),
        ];
        let arg = AggregateArg {
            experiment: dir.path().to_owned(),
            campaign: CampaignArg {
                schema: generation,
                config: None,
                approaches: None,
                benchmarks: None,
                trials: None,
            },
            metrics: None,
            duration_minutes: 60.0,
            json: None,
            csv_dir: None,
        };

        let metric = MetricSelector::Metric("valid_paths".to_owned());
        let records = aggregate_benchmark(&experiment, &campaign, &metric, "ant", &arg).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].approach, "zest");
        let (mean, std_error) = records[0].series.last().unwrap();
        assert!((mean - 3.0).abs() < 1e-12);
        assert!((std_error - FRAC_1_SQRT_2).abs() < 1e-12);
        assert_eq!(records[0].time_minutes.len(), experiment.samples());
    }
}
