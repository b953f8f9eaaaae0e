//! Aggregate series table display

use fuzzstat_analysis::aggregate::AggregateSeries;

/// A row in an aggregate table
pub(super) struct SeriesTableRow<'a> {
    /// Display name of the approach
    pub label: String,
    pub series: &'a AggregateSeries,
}

fn print_series_table_header() {
    println!(
        "  {:<20} {:>8} {:>14} {:>14} {:>14}",
        "Approach", "Trials", "Mean(Mid)", "Mean(Final)", "StdErr(Final)",
    );
}

fn print_series_table_separator() {
    // label(20) + trials(8) + mid(14) + final(14) + stderr(14) + spaces(4)
    println!("  {}", "-".repeat(74));
}

fn format_value(value: f64, percent: bool) -> String {
    if percent {
        format!("{:.1}%", value * 100.0)
    } else {
        format!("{value:.1}")
    }
}

fn print_series_table_row(row: &SeriesTableRow, percent: bool) {
    let series = row.series;
    let mid = series
        .mean
        .get(series.len() / 2)
        .map_or("N/A".to_string(), |v| format_value(*v, percent));
    let (final_mean, final_err) = series.last().map_or(
        ("N/A".to_string(), "N/A".to_string()),
        |(mean, err)| (format_value(mean, percent), format_value(err, percent)),
    );

    println!(
        "  {:<20} {:>8} {:>14} {:>14} {:>14}",
        row.label, series.trials, mid, final_mean, final_err,
    );
}

/// Print a formatted table of aggregated series
///
/// # Arguments
/// * `rows` - One row per approach
/// * `percent` - Whether values are ratios to display as percentages
pub(super) fn print_series_table(rows: &[SeriesTableRow], percent: bool) {
    print_series_table_header();
    print_series_table_separator();

    if rows.is_empty() {
        println!("  (no trials)");
    }
    for row in rows {
        print_series_table_row(row, percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.375, true), "37.5%");
        assert_eq!(format_value(1234.56, false), "1234.6");
    }
}
