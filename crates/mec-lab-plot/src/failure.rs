//! Utility retained under fault injection. Failures are injected on
//! alternating fixed-width windows, so only the odd windows carry faults;
//! their utility sums are divided by the fault-free run's sums over the
//! same windows.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, GroupedBars};
use crate::frame::{Frame, parse_f64};
use crate::labels::ratio_label;
use crate::stats::CellMeans;

const UTILITY_COLUMN: &str = "utility:vector";

pub struct FailureArgs {
    pub link_csv: PathBuf,
    pub node_csv: PathBuf,
    /// Extraction of the fault-free run, same column layout.
    pub base_csv: PathBuf,
    /// Width of one injection window in simulated seconds.
    pub interval: f64,
    pub out: PathBuf,
}

pub fn run(args: &FailureArgs) -> Result<()> {
    let base = Frame::from_csv(&args.base_csv)?;
    let base_windows = base_window_sums(&base, args.interval)?;

    let mut means = CellMeans::default();
    for (series, path) in [("Link", &args.link_csv), ("Node", &args.node_csv)] {
        let frame = Frame::from_csv(path)?;
        for ((label, window), sum) in run_window_sums(&frame, args.interval)? {
            let Some(base_sum) = base_windows.get(&window).filter(|s| **s > 0.0) else {
                continue;
            };
            means.add(&label, series, sum / base_sum);
        }
    }

    for ((category, series), mean) in means.means() {
        println!("{series} {category}: {mean:.3}");
    }

    let values = means.means();
    let categories: Vec<String> = values
        .keys()
        .map(|(category, _)| category.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let spec = GroupedBars {
        x_label: "Failure Probability".to_string(),
        y_label: "Utility Ratio to Fault-Free Run".to_string(),
        categories,
        series: vec!["Link".to_string(), "Node".to_string()],
        values,
        y_max: Some(1.2),
    };
    chart::draw_grouped_bars(&spec, &args.out)
}

/// Utility summed per (run label, odd window index).
pub fn run_window_sums(
    frame: &Frame,
    interval: f64,
) -> Result<BTreeMap<(String, i64), f64>> {
    let time = frame.column("time")?;
    let route_update = frame.column("routeUpdate")?;
    let error_prob = frame.column("errorProb")?;
    let utility = frame.column(UTILITY_COLUMN)?;

    let mut sums = BTreeMap::new();
    for row in frame.rows() {
        let window = (parse_f64(&row[time])? / interval) as i64;
        if window % 2 != 1 {
            continue;
        }
        let label = ratio_label(&row[error_prob], &row[route_update]);
        *sums.entry((label, window)).or_default() += parse_f64(&row[utility])?;
    }
    Ok(sums)
}

/// The fault-free run's utility per odd window, all runs in the file pooled.
pub fn base_window_sums(frame: &Frame, interval: f64) -> Result<BTreeMap<i64, f64>> {
    let time = frame.column("time")?;
    let utility = frame.column(UTILITY_COLUMN)?;

    let mut sums = BTreeMap::new();
    for row in frame.rows() {
        let window = (parse_f64(&row[time])? / interval) as i64;
        if window % 2 != 1 {
            continue;
        }
        *sums.entry(window).or_default() += parse_f64(&row[utility])?;
    }
    Ok(sums)
}
