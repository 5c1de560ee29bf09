//! The fault-free study: per-run scalar means and normalized sums from the
//! `results/Normal` scalar files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use mec_lab_trace::{
    CsvSink, NanPolicy, RunPattern, ScalarMode, ScalarQuery, ScalarScan, format_value,
};

use crate::campaign::{Campaign, RunSummary, file_name, result_files};

const IMPROVED_METRICS: [&str; 3] = [
    "utility:sum",
    "meetDlPkt:sum",
    "jobGeneratedSinceGranted:sum",
];

pub fn run(campaign: &Campaign) -> Result<RunSummary> {
    let files = result_files(&campaign.results_dir, "sca")?;
    let pattern = RunPattern::interval_app_count()?;
    let mut summary = RunSummary::new("normal");
    summary.files_seen = files.len();

    single_scalar_mean(
        campaign,
        &files,
        &pattern,
        "schemeUtility:mean",
        "expected_utility_mean.csv",
        "utility",
        &mut summary,
    )?;
    single_scalar_mean(
        campaign,
        &files,
        &pattern,
        "expectedJobsToBeOffloaded:mean",
        "expected_job_count_mean.csv",
        "job_count",
        &mut summary,
    )?;
    improved_utility(campaign, &files, &pattern, &mut summary)?;

    Ok(summary)
}

/// One row per run: the first valid occurrence of a single `:mean` scalar.
/// A run where the scalar never appears (or is `-nan` throughout) still
/// gets a row, with an empty value cell.
fn single_scalar_mean(
    campaign: &Campaign,
    files: &[PathBuf],
    pattern: &RunPattern,
    scalar_name: &str,
    out_name: &str,
    value_column: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    let out_path = campaign.out_dir.join(out_name);
    let mut sink = CsvSink::create(&out_path, &["algorithm", "interval", value_column])?;
    let mode = campaign.scalar_mode_or(ScalarMode::First);
    let queries = [ScalarQuery::new(
        scalar_name,
        mode,
        campaign.nan_policy_or(NanPolicy::Skip),
    )];

    let mut matched = 0;
    for path in files {
        let Some(params) = file_name(path).and_then(|name| pattern.captures(name)) else {
            debug!(file = %path.display(), "filename does not match, skipping");
            continue;
        };
        matched += 1;

        let scan = ScalarScan::read(path, &queries)?;
        let value = scan
            .reading(scalar_name)
            .reduce(mode)
            .map(format_value)
            .unwrap_or_default();
        sink.write_row([
            params.get("algorithm").unwrap_or("Unknown"),
            params.get("interval").unwrap_or("Unknown"),
            value.as_str(),
        ])?;
    }

    let rows = sink.finish()?;
    summary.record(&out_path, matched, rows);
    Ok(())
}

/// Sums each metric across every module instance and divides by the run's
/// simulation time limit, giving a per-second mean.
fn improved_utility(
    campaign: &Campaign,
    files: &[PathBuf],
    pattern: &RunPattern,
    summary: &mut RunSummary,
) -> Result<()> {
    let metrics = campaign.metrics_or(&IMPROVED_METRICS);
    let out_path = campaign.out_dir.join("improved_utility_mean.csv");

    let mut header = vec!["algorithm".to_string(), "interval".to_string()];
    header.extend(metrics.iter().map(|name| name.replace(":sum", ":mean")));
    let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    let mut sink = CsvSink::create(&out_path, &header_refs)?;

    // Summing across instances is what the `:mean` header math relies on,
    // so only the NaN handling is overridable here.
    let queries: Vec<ScalarQuery> = metrics
        .iter()
        .map(|name| {
            ScalarQuery::new(name, ScalarMode::Sum, campaign.nan_policy_or(NanPolicy::Skip))
        })
        .collect();

    let mut matched = 0;
    for path in files {
        let Some(params) = file_name(path).and_then(|name| pattern.captures(name)) else {
            debug!(file = %path.display(), "filename does not match, skipping");
            continue;
        };
        matched += 1;

        let scan = ScalarScan::read(path, &queries)?;
        let mut row = vec![
            params.get("algorithm").unwrap_or("Unknown").to_string(),
            params.get("interval").unwrap_or("Unknown").to_string(),
        ];
        for name in &metrics {
            let mean = scan.reading(name).sum() / scan.sim_time_limit;
            row.push(format_value(mean));
        }
        sink.write_row(row)?;
    }

    let rows = sink.finish()?;
    summary.record(&out_path, matched, rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn campaign(root: &Path) -> Campaign {
        let results = root.join("results");
        let out = root.join("analysis");
        fs::create_dir_all(&results).unwrap();
        Campaign::resolve(
            results.to_str().unwrap(),
            out.to_str().unwrap(),
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn extracts_first_valid_mean_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let campaign = campaign(dir.path());
        fs::write(
            campaign.results_dir.join("Greedy-interval-10-appCount-3.sca"),
            "scalar DeMEC.gnb[0].scheduler schemeUtility:mean -nan\n\
             scalar DeMEC.gnb[1].scheduler schemeUtility:mean 45.5\n",
        )
        .unwrap();
        fs::write(
            campaign.results_dir.join("FastSA-interval-10-appCount-3.sca"),
            "scalar DeMEC.gnb[0].scheduler schemeUtility:mean 50.25\n",
        )
        .unwrap();
        // Does not follow the naming convention: contributes nothing.
        fs::write(
            campaign.results_dir.join("General-run-0.sca"),
            "scalar DeMEC.gnb[0].scheduler schemeUtility:mean 1\n",
        )
        .unwrap();

        let summary = run(&campaign).unwrap();
        assert_eq!(summary.files_seen, 3);
        assert_eq!(summary.outputs[0].files_matched, 2);

        let csv = read(&campaign.out_dir.join("expected_utility_mean.csv"));
        assert_eq!(
            csv,
            "algorithm,interval,utility\n\
             FastSA,10,50.25\n\
             Greedy,10,45.5\n"
        );
    }

    #[test]
    fn nan_policy_override_writes_nan_through() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        fs::create_dir_all(&results).unwrap();
        let overrides = crate::campaign::CampaignOverride {
            nan_policy: Some(NanPolicy::Keep),
            ..Default::default()
        };
        let campaign = Campaign::resolve(
            results.to_str().unwrap(),
            dir.path().join("analysis").to_str().unwrap(),
            None,
            None,
            Some(overrides),
        )
        .unwrap();
        fs::write(
            campaign.results_dir.join("Greedy-interval-10-appCount-3.sca"),
            "scalar DeMEC.gnb[0].scheduler schemeUtility:mean -nan\n\
             scalar DeMEC.gnb[1].scheduler schemeUtility:mean 45.5\n",
        )
        .unwrap();

        run(&campaign).unwrap();

        let csv = read(&campaign.out_dir.join("expected_utility_mean.csv"));
        assert_eq!(csv, "algorithm,interval,utility\nGreedy,10,NaN\n");
    }

    #[test]
    fn improved_utility_normalizes_by_time_limit() {
        let dir = tempfile::tempdir().unwrap();
        let campaign = campaign(dir.path());
        fs::write(
            campaign.results_dir.join("Greedy-interval-10-appCount-3.sca"),
            "config sim-time-limit 100s\n\
             scalar DeMEC.gnb[0].server utility:sum 120\n\
             scalar DeMEC.gnb[1].server utility:sum 80\n\
             scalar DeMEC.gnb[0].server meetDlPkt:sum 50\n",
        )
        .unwrap();

        run(&campaign).unwrap();

        let csv = read(&campaign.out_dir.join("improved_utility_mean.csv"));
        assert_eq!(
            csv,
            "algorithm,interval,utility:mean,meetDlPkt:mean,jobGeneratedSinceGranted:mean\n\
             Greedy,10,2,0.5,0\n"
        );
    }
}
