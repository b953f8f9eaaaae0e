//! Crash table rendering

use std::fmt::Write as _;

const LABEL_HEADER: &str = "Crash";
const CAPTION: &str =
    "Average time (in minutes) and reliability of triggering a particular crash.";

/// A row in the crash table
pub(super) struct CrashTableRow {
    /// `{benchmark}.{crash}`
    pub label: String,
    /// One cell per approach, in header order
    pub cells: Vec<String>,
}

/// Render the crash table as fixed-width text
///
/// # Arguments
/// * `headers` - Approach names, one per column
/// * `rows` - Table rows
pub(super) fn render_crash_table(
    headers: &[String],
    rows: &[CrashTableRow],
) -> anyhow::Result<String> {
    let label_width = rows
        .iter()
        .map(|r| r.label.len())
        .chain([LABEL_HEADER.len()])
        .max()
        .unwrap_or_default();
    let widths = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.cells.get(i))
                .map(String::len)
                .chain([h.len()])
                .max()
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();
    let total_width = label_width + widths.iter().map(|w| w + 2).sum::<usize>();

    let mut out = String::new();
    write!(out, "  {LABEL_HEADER:<label_width$}")?;
    for (header, width) in headers.iter().zip(&widths) {
        write!(out, "  {header:>width$}")?;
    }
    out.push('\n');
    writeln!(out, "  {}", "-".repeat(total_width))?;
    if rows.is_empty() {
        writeln!(out, "  (no crashes found)")?;
    }
    for row in rows {
        write!(out, "  {:<label_width$}", row.label)?;
        for (cell, width) in row.cells.iter().zip(&widths) {
            write!(out, "  {cell:>width$}")?;
        }
        out.push('\n');
    }
    writeln!(out, "\n{CAPTION}")?;
    Ok(out)
}
