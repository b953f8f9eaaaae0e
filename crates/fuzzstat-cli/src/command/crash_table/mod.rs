//! Crash discovery table command
//!
//! For every benchmark, lists each distinct crash found by any approach with
//! the mean time to first discovery (in minutes) and the percentage of trials
//! that discovered it. Crash logs are always read from the non-replay trial
//! directories.

mod table;

use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Context;
use clap::Args;
use fuzzstat_analysis::crash::{CrashCampaign, CrashSummary, crash_label};

use crate::{command::CampaignArg, util::Output};

use self::table::CrashTableRow;

#[derive(Debug, Clone, Args)]
pub(crate) struct CrashTableArg {
    /// Results directory with one subdirectory per trial
    pub results: PathBuf,

    #[clap(flatten)]
    pub campaign: CampaignArg,

    /// Also write the table to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CrashTableArg) -> anyhow::Result<()> {
    let campaign = arg.campaign.resolve(None)?;

    let mut rows = vec![];
    for benchmark in &campaign.benchmarks {
        let summaries = campaign
            .approaches
            .iter()
            .map(|approach| {
                CrashCampaign::scan(&arg.results, &approach.name, benchmark, campaign.trials)
                    .map(|c| c.summarize())
                    .with_context(|| {
                        format!("Failed to scan crash logs of {}-{benchmark}", approach.name)
                    })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        tracing::info!(benchmark = %benchmark, "scanned crash logs");

        let crashes = summaries
            .iter()
            .flat_map(|s| s.keys())
            .collect::<BTreeSet<_>>();
        for crash in crashes {
            rows.push(CrashTableRow {
                label: format!("{benchmark}.{}", crash_label(crash)),
                cells: summaries
                    .iter()
                    .map(|s| s.get(crash).map_or_else(|| "-".to_string(), format_cell))
                    .collect(),
            });
        }
    }

    let headers = campaign
        .approaches
        .iter()
        .map(|a| a.label().to_owned())
        .collect::<Vec<_>>();
    let text = table::render_crash_table(&headers, &rows)?;

    Output::stdout().write_text(&text)?;
    if let Some(path) = &arg.output {
        Output::open(path.clone())?.write_text(&text)?;
        eprintln!("Crash table saved to: {}", path.display());
    }

    Ok(())
}

/// `"{minutes} ({reliability}%)"`, with `<1` for crashes found within a minute.
fn format_cell(summary: &CrashSummary) -> String {
    let minutes = summary.mean_time_minutes();
    let reliability = summary.reliability.trunc();
    if minutes >= 1.0 {
        format!("{minutes:.0} ({reliability:.0}%)")
    } else {
        format!("<1 ({reliability:.0}%)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(mean_time_ms: f64, reliability: f64) -> CrashSummary {
        CrashSummary {
            mean_time_ms,
            reliability,
            observed_trials: 1,
        }
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&summary(180_000.0, 20.0)), "3 (20%)");
        assert_eq!(format_cell(&summary(59_999.0, 100.0)), "<1 (100%)");
        assert_eq!(format_cell(&summary(60_000.0, 6.67)), "1 (6%)");
    }
}
