//! Per-load comparison: buckets the pending application count into labeled
//! ranges and compares scheme means of one value column within each range.

use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, GroupedBars};
use crate::frame::{Frame, parse_f64, range_label};
use crate::labels::scheme_label;
use crate::stats::CellMeans;

const LOAD_COLUMN: &str = "pendingAppCount:vector";
const LOAD_BOUNDS: [(f64, &str); 3] = [(65.0, "20-65"), (110.0, "65-110"), (155.0, "110-155")];
const LOAD_LAST: &str = "155-200";

pub struct AppCountArgs {
    pub csv: PathBuf,
    /// Column to average per (range, scheme), e.g. `savedEnergy:vector`.
    pub value_column: String,
    /// Raw values are divided by this before averaging; energy columns use
    /// `10000` to turn per-window millijoules into J/s.
    pub divisor: f64,
    pub y_label: String,
    pub out: PathBuf,
    pub baseline: String,
}

pub fn run(args: &AppCountArgs) -> Result<()> {
    let frame = Frame::from_csv(&args.csv)?;
    let means = bucket_cells(&frame, &args.value_column, args.divisor)?;

    let series = means.series_order(&args.baseline);
    let series_refs: Vec<&str> = series.iter().map(String::as_str).collect();
    means.print_baseline_gaps(&args.baseline, &series_refs);

    let values = means.means();
    let mut categories: Vec<String> = LOAD_BOUNDS
        .iter()
        .map(|(_, label)| label.to_string())
        .collect();
    categories.push(LOAD_LAST.to_string());
    categories.retain(|c| values.keys().any(|(category, _)| category == c));

    let spec = GroupedBars {
        x_label: "Pending Application Count".to_string(),
        y_label: args.y_label.clone(),
        categories,
        series,
        values,
        y_max: None,
    };
    chart::draw_grouped_bars(&spec, &args.out)
}

pub fn bucket_cells(frame: &Frame, value_column: &str, divisor: f64) -> Result<CellMeans> {
    let algorithm = frame.column("algorithm")?;
    let load = frame.column(LOAD_COLUMN)?;
    let value = frame.column(value_column)?;

    let mut means = CellMeans::default();
    for row in frame.rows() {
        let pending = parse_f64(&row[load])?;
        let range = range_label(pending, &LOAD_BOUNDS, LOAD_LAST);
        means.add(
            range,
            scheme_label(&row[algorithm]),
            parse_f64(&row[value])? / divisor,
        );
    }
    Ok(means)
}
