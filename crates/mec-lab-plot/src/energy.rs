//! Energy-saving comparison across network quality levels. Reads the
//! per-run energy sums extracted from a MEC campaign and renders them as
//! J/s grouped by CQI pilot setting.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, GroupedBars};
use crate::frame::{Frame, parse_f64};
use crate::labels::{quality_label, scheme_label};
use crate::stats::CellMeans;

/// Runs last 900 simulated seconds and record millijoules.
const JOULES_PER_SECOND: f64 = 900.0 * 1000.0;

const QUALITY_ORDER: [&str; 3] = ["HIGH", "MEDIUM", "LOW"];

pub struct EnergyArgs {
    pub csv: PathBuf,
    /// Offload-energy CSV to subtract, turning expected savings into
    /// measured ones.
    pub measured: Option<PathBuf>,
    pub out: PathBuf,
    pub baseline: String,
}

pub fn run(args: &EnergyArgs) -> Result<()> {
    let frame = Frame::from_csv(&args.csv)?;
    let offload = args
        .measured
        .as_deref()
        .map(Frame::from_csv)
        .transpose()?;
    let means = energy_cells(&frame, offload.as_ref())?;

    let series = means.series_order(&args.baseline);
    let series_refs: Vec<&str> = series.iter().map(String::as_str).collect();
    means.print_baseline_gaps(&args.baseline, &series_refs);

    let values = means.means();
    let categories = QUALITY_ORDER
        .iter()
        .filter(|q| values.keys().any(|(category, _)| category == *q))
        .map(|q| q.to_string())
        .collect();
    let spec = GroupedBars {
        x_label: "Network Quality Level".to_string(),
        y_label: "Energy Saving (J/s)".to_string(),
        categories,
        series,
        values,
        y_max: None,
    };
    chart::draw_grouped_bars(&spec, &args.out)
}

/// Per-(quality, scheme) mean of the J/s savings. Without an offload frame
/// every row is one observation; with one, occurrences are summed per run
/// and the run's offload energy is deducted first.
pub fn energy_cells(frame: &Frame, offload: Option<&Frame>) -> Result<CellMeans> {
    let algorithm = frame.column("algorithm")?;
    let pilot = frame.column("pilot")?;
    let energy = frame.column("energy")?;

    let mut means = CellMeans::default();
    match offload {
        None => {
            for row in frame.rows() {
                if row[energy].is_empty() {
                    continue;
                }
                means.add(
                    quality_label(&row[pilot]),
                    scheme_label(&row[algorithm]),
                    parse_f64(&row[energy])? / JOULES_PER_SECOND,
                );
            }
        }
        Some(offload) => {
            let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
            for row in frame.rows() {
                if row[energy].is_empty() {
                    continue;
                }
                *totals
                    .entry((row[algorithm].clone(), row[pilot].clone()))
                    .or_default() += parse_f64(&row[energy])?;
            }
            for (key, spent) in run_energies(offload)? {
                *totals.entry(key).or_default() -= spent;
            }
            for ((raw_algorithm, raw_pilot), total) in totals {
                means.add(
                    quality_label(&raw_pilot),
                    scheme_label(&raw_algorithm),
                    total / JOULES_PER_SECOND,
                );
            }
        }
    }
    Ok(means)
}

fn run_energies(frame: &Frame) -> Result<BTreeMap<(String, String), f64>> {
    let algorithm = frame.column("algorithm")?;
    let pilot = frame.column("pilot")?;
    let energy = frame.column("energy")?;

    let mut totals = BTreeMap::new();
    for row in frame.rows() {
        if row[energy].is_empty() {
            continue;
        }
        *totals
            .entry((row[algorithm].clone(), row[pilot].clone()))
            .or_default() += parse_f64(&row[energy])?;
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn frame_from(content: &str) -> Frame {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        Frame::from_csv(file.path()).unwrap()
    }

    #[test]
    fn rows_convert_to_joules_per_second() {
        let frame = frame_from(
            "algorithm,pilot,energy\n\
             SARound,MAX_CQI,900000\n\
             SARound,MAX_CQI,1800000\n\
             Greedy,MIN_CQI,\n",
        );
        let means = energy_cells(&frame, None).unwrap();
        let cells = means.means();
        assert_eq!(cells[&("HIGH".to_string(), "SARound".to_string())], 1.5);
        assert!(!cells.contains_key(&("LOW".to_string(), "Greedy".to_string())));
    }

    #[test]
    fn measured_mode_deducts_offload_energy() {
        let actual = frame_from(
            "algorithm,pilot,energy\n\
             GameTheory,MEDIAN_CQI,1200000\n\
             GameTheory,MEDIAN_CQI,600000\n",
        );
        let offload = frame_from(
            "algorithm,pilot,energy\n\
             GameTheory,MEDIAN_CQI,900000\n",
        );
        let means = energy_cells(&actual, Some(&offload)).unwrap();
        let cells = means.means();
        assert_eq!(cells[&("MEDIUM".to_string(), "Game".to_string())], 1.0);
    }

    #[test]
    fn baseline_listed_first() {
        let frame = frame_from(
            "algorithm,pilot,energy\n\
             Greedy,MAX_CQI,900\n\
             SARound,MAX_CQI,900\n",
        );
        let means = energy_cells(&frame, None).unwrap();
        assert_eq!(means.series_order("SARound"), ["SARound", "Greedy"]);
    }
}
