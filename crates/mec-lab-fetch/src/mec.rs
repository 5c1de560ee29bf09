//! Centralized MEC study: per-run energy scalars swept over the scheduling
//! flags encoded in the filenames, plus the app-count vector summary.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use mec_lab_trace::{
    Accumulate, CsvSink, MetricTable, NanPolicy, RunParams, RunPattern, ScalarMode, ScalarQuery,
    ScalarScan, TimeFormat, VectorQuery, format_time, format_value, read_declarations,
    read_samples,
};

use crate::campaign::{Campaign, RunSummary, file_name, result_files};

const APP_COUNT_METRICS: [&str; 3] = [
    "pendingAppCount:vector",
    "savedEnergy:vector",
    "schemeTime:vector",
];

/// How occurrences of an energy scalar map to CSV rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPolicy {
    /// One row per run; an empty value cell when the scalar is absent.
    PerRun,
    /// One row per occurrence (module instance); absent scalars yield none.
    PerOccurrence,
}

struct EnergyOutput {
    scalar_name: &'static str,
    file_suffix: &'static str,
    policy: RowPolicy,
}

const ENERGY_OUTPUTS: [EnergyOutput; 3] = [
    EnergyOutput {
        scalar_name: "savedEnergy:sum",
        file_suffix: "expected_energy_sum",
        policy: RowPolicy::PerRun,
    },
    EnergyOutput {
        scalar_name: "vehSavedEnergy:sum",
        file_suffix: "actual_energy_sum",
        policy: RowPolicy::PerOccurrence,
    },
    EnergyOutput {
        scalar_name: "offloadEnergyConsumed:sum",
        file_suffix: "offload_energy_sum",
        policy: RowPolicy::PerRun,
    },
];

/// Full MEC test 1: sweep `scheAll` x `countExeTime`.
pub fn run_mec1(campaign: &Campaign) -> Result<RunSummary> {
    let pattern = RunPattern::sche_exe_time()?;
    let mut summary = RunSummary::new("mec1");
    let files = result_files(&campaign.results_dir, "sca")?;
    summary.files_seen = files.len();

    for sche_all in ["true", "false"] {
        for count_exe_time in ["true", "false"] {
            info!(sche_all, count_exe_time, "extracting energy scalars");
            let filters = [("sche_all", sche_all), ("count_exe_time", count_exe_time)];
            let prefix = format!("scheAll_{sche_all}_countExeTime_{count_exe_time}");
            extract_energy(campaign, &files, &pattern, &filters, &prefix, &mut summary)?;
        }
    }
    Ok(summary)
}

/// Full MEC test 2: sweep `scheAll` x fairness `factor`.
pub fn run_mec2(campaign: &Campaign) -> Result<RunSummary> {
    let pattern = RunPattern::sche_factor()?;
    let mut summary = RunSummary::new("mec2");
    let files = result_files(&campaign.results_dir, "sca")?;
    summary.files_seen = files.len();

    for sche_all in ["true", "false"] {
        for factor in ["0.17", "0.25", "0.5"] {
            info!(sche_all, factor, "extracting energy scalars");
            let filters = [("sche_all", sche_all), ("factor", factor)];
            let prefix = format!("scheAll_{sche_all}_factor_{factor}");
            extract_energy(campaign, &files, &pattern, &filters, &prefix, &mut summary)?;
        }
    }
    Ok(summary)
}

fn matches_filters(params: &RunParams, filters: &[(&str, &str)]) -> bool {
    filters
        .iter()
        .all(|(field, value)| params.get(field) == Some(*value))
}

fn extract_energy(
    campaign: &Campaign,
    files: &[PathBuf],
    pattern: &RunPattern,
    filters: &[(&str, &str)],
    prefix: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    for output in &ENERGY_OUTPUTS {
        let out_path = campaign
            .out_dir
            .join(format!("{prefix}_{}.csv", output.file_suffix));
        let mut sink = CsvSink::create(&out_path, &["algorithm", "pilot", "energy"])?;
        // Energy CSVs carry `-nan` values through verbatim.
        let queries = [ScalarQuery::new(
            output.scalar_name,
            ScalarMode::First,
            campaign.nan_policy_or(NanPolicy::Keep),
        )];

        let mut matched = 0;
        for path in files {
            let Some(params) = file_name(path).and_then(|name| pattern.captures(name)) else {
                debug!(file = %path.display(), "filename does not match, skipping");
                continue;
            };
            if !matches_filters(&params, filters) {
                continue;
            }
            matched += 1;
            let algorithm = params.get("algorithm").unwrap_or("Unknown");
            let pilot = params.get("pilot").unwrap_or("Unknown");

            let scan = ScalarScan::read(path, &queries)?;
            let reading = scan.reading(output.scalar_name);
            match output.policy {
                RowPolicy::PerRun => {
                    let value = reading.first().map(format_value).unwrap_or_default();
                    sink.write_row([algorithm, pilot, value.as_str()])?;
                }
                RowPolicy::PerOccurrence => {
                    for value in &reading.occurrences {
                        let formatted = format_value(*value);
                        sink.write_row([algorithm, pilot, formatted.as_str()])?;
                    }
                }
            }
        }

        let rows = sink.finish()?;
        summary.record(&out_path, matched, rows);
    }
    Ok(())
}

/// App-count test for MEC 1: per-second vector summary from
/// `scheme-ALGO-appCount-N.vec` runs.
pub fn run_app_count(campaign: &Campaign) -> Result<RunSummary> {
    let files = result_files(&campaign.results_dir, "vec")?;
    let pattern = RunPattern::scheme_app_count()?;
    let metrics = campaign.metrics_or(&APP_COUNT_METRICS);

    let mut summary = RunSummary::new("mec-app-count");
    summary.files_seen = files.len();

    let out_path = campaign.out_dir.join("app_count_summary.csv");
    let mut header = vec!["time".to_string(), "algorithm".to_string()];
    header.extend(metrics.iter().cloned());
    let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    let mut sink = CsvSink::create(&out_path, &header_refs)?;

    let mut matched = 0;
    for path in &files {
        let Some(params) = file_name(path).and_then(|name| pattern.captures(name)) else {
            debug!(file = %path.display(), "filename does not match, skipping");
            continue;
        };
        matched += 1;
        let algorithm = params.get("algorithm").unwrap_or("Unknown").to_string();

        let ids = read_declarations(path, &metrics)?;
        let queries: Vec<VectorQuery> = metrics
            .iter()
            .map(|name| VectorQuery::new(name, Accumulate::LastWinsPerSecond))
            .collect();
        let data = read_samples(path, &ids, &queries)?;

        let table = MetricTable::from_series(&data, &metrics);
        for (time, cells) in table.rows() {
            let mut row = vec![format_time(time, TimeFormat::Seconds), algorithm.clone()];
            row.extend(cells.iter().map(|v| format_value(*v)));
            sink.write_row(row)?;
        }
    }

    let rows = sink.finish()?;
    summary.record(&out_path, matched, rows);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn campaign(root: &Path) -> Campaign {
        let results = root.join("results");
        fs::create_dir_all(&results).unwrap();
        Campaign::resolve(
            results.to_str().unwrap(),
            root.join("analysis").to_str().unwrap(),
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn energy_sweep_filters_and_row_policies() {
        let dir = tempfile::tempdir().unwrap();
        let campaign = campaign(dir.path());
        fs::write(
            campaign
                .results_dir
                .join("Full-scheAll-true-countExeTime-true-Greedy-pilot-MAX_CQI.sca"),
            "scalar MEC.server savedEnergy:sum 1200\n\
             scalar MEC.veh[0] vehSavedEnergy:sum 500\n\
             scalar MEC.veh[1] vehSavedEnergy:sum 700\n",
        )
        .unwrap();
        // Different sweep point: excluded from the true/true outputs.
        fs::write(
            campaign
                .results_dir
                .join("Full-scheAll-false-countExeTime-true-Greedy-pilot-MAX_CQI.sca"),
            "scalar MEC.server savedEnergy:sum 9999\n",
        )
        .unwrap();

        run_mec1(&campaign).unwrap();

        let expected = fs::read_to_string(
            campaign
                .out_dir
                .join("scheAll_true_countExeTime_true_expected_energy_sum.csv"),
        )
        .unwrap();
        assert_eq!(expected, "algorithm,pilot,energy\nGreedy,MAX_CQI,1200\n");

        let actual = fs::read_to_string(
            campaign
                .out_dir
                .join("scheAll_true_countExeTime_true_actual_energy_sum.csv"),
        )
        .unwrap();
        assert_eq!(
            actual,
            "algorithm,pilot,energy\nGreedy,MAX_CQI,500\nGreedy,MAX_CQI,700\n"
        );

        // Absent scalar still yields a per-run row with an empty cell.
        let offload = fs::read_to_string(
            campaign
                .out_dir
                .join("scheAll_true_countExeTime_true_offload_energy_sum.csv"),
        )
        .unwrap();
        assert_eq!(offload, "algorithm,pilot,energy\nGreedy,MAX_CQI,\n");
    }

    #[test]
    fn app_count_summary_truncates_times() {
        let dir = tempfile::tempdir().unwrap();
        let campaign = campaign(dir.path());
        fs::write(
            campaign.results_dir.join("scheme-FastLR-appCount-1.vec"),
            "\
vector 0 VEC.scheduler pendingAppCount:vector ETV
vector 1 VEC.scheduler savedEnergy:vector ETV
0 1 10 48
1 2 10 759172.84
0 3 20 52
",
        )
        .unwrap();

        run_app_count(&campaign).unwrap();

        let csv = fs::read_to_string(campaign.out_dir.join("app_count_summary.csv")).unwrap();
        assert_eq!(
            csv,
            "time,algorithm,pendingAppCount:vector,savedEnergy:vector,schemeTime:vector\n\
             10,FastLR,48,759172.84,0\n\
             20,FastLR,52,0,0\n"
        );
    }
}
