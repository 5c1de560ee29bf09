//! Fault-free study comparison: per-scheme means of one scalar column,
//! grouped by scheduling interval. Works on both the expected-utility and
//! the normalized (improved) extraction CSVs.

use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, GroupedBars};
use crate::frame::{Frame, parse_f64};
use crate::labels::scheme_label;
use crate::stats::CellMeans;

pub struct UtilityArgs {
    pub csv: PathBuf,
    /// Column to average per (interval, scheme), e.g. `utility` or
    /// `utility:mean`.
    pub value_column: String,
    pub y_label: String,
    pub out: PathBuf,
    pub baseline: String,
}

pub fn run(args: &UtilityArgs) -> Result<()> {
    let frame = Frame::from_csv(&args.csv)?;
    let means = interval_cells(&frame, &args.value_column)?;

    let series = means.series_order(&args.baseline);
    let series_refs: Vec<&str> = series.iter().map(String::as_str).collect();
    means.print_baseline_gaps(&args.baseline, &series_refs);

    let values = means.means();
    let spec = GroupedBars {
        x_label: "Scheduling Interval (s)".to_string(),
        y_label: args.y_label.clone(),
        categories: interval_order(&values),
        series,
        values,
        y_max: None,
    };
    chart::draw_grouped_bars(&spec, &args.out)
}

/// Per-(interval, scheme) mean of the value column. Runs where the scalar
/// was missing carry an empty cell and contribute nothing.
pub fn interval_cells(frame: &Frame, value_column: &str) -> Result<CellMeans> {
    let algorithm = frame.column("algorithm")?;
    let interval = frame.column("interval")?;
    let value = frame.column(value_column)?;

    let mut means = CellMeans::default();
    for row in frame.rows() {
        if row[value].is_empty() {
            continue;
        }
        means.add(
            &row[interval],
            scheme_label(&row[algorithm]),
            parse_f64(&row[value])?,
        );
    }
    Ok(means)
}

/// Interval labels in numeric order; `10` sorts after `5`, not before.
fn interval_order(values: &std::collections::BTreeMap<(String, String), f64>) -> Vec<String> {
    let mut intervals: Vec<String> = values
        .keys()
        .map(|(interval, _)| interval.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    intervals.sort_by(|a, b| {
        let a = a.parse::<f64>().unwrap_or(f64::MAX);
        let b = b.parse::<f64>().unwrap_or(f64::MAX);
        a.total_cmp(&b)
    });
    intervals
}
