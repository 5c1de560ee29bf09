//! Scheduler recovery time as a function of failure probability, one line
//! per failure kind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, LineChart};
use crate::frame::{Frame, parse_f64};

pub struct RecoveryArgs {
    pub link_csv: PathBuf,
    pub node_csv: PathBuf,
    pub out: PathBuf,
}

pub fn run(args: &RecoveryArgs) -> Result<()> {
    let mut series = Vec::new();
    for (label, path) in [("Link", &args.link_csv), ("Node", &args.node_csv)] {
        let frame = Frame::from_csv(path)?;
        let points = mean_recovery_times(&frame)?;
        for (prob, mean) in &points {
            println!("{label} p={prob}: {mean:.3}s");
        }
        series.push((label.to_string(), points));
    }

    let spec = LineChart {
        x_label: "Failure Probability".to_string(),
        y_label: "Recovery Time (s)".to_string(),
        series,
    };
    chart::draw_lines(&spec, &args.out)
}

/// Mean recovery time per failure probability, sorted by probability.
pub fn mean_recovery_times(frame: &Frame) -> Result<Vec<(f64, f64)>> {
    let error_prob = frame.column("error_prob")?;
    let recovery = frame.column("recovery_time")?;

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in frame.rows() {
        let cell = sums.entry(row[error_prob].clone()).or_default();
        cell.0 += parse_f64(&row[recovery])?;
        cell.1 += 1;
    }

    let mut points = Vec::with_capacity(sums.len());
    for (prob, (sum, count)) in sums {
        points.push((parse_f64(&prob)?, sum / count as f64));
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(points)
}
