//! Fault-injection study: per-second utility under link and node failures,
//! plus scheduler recovery times. Vector declarations come from the `.vci`
//! index files, the samples from the `.vec` bodies.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use mec_lab_trace::{
    Accumulate, CsvSink, MetricTable, RunPattern, TimeFormat, VectorQuery, format_time,
    format_value, read_index_declarations, read_samples,
};

use crate::campaign::{Campaign, RunSummary, file_name, result_files};

const DATA_METRICS: [&str; 2] = ["utility:vector", "meetDlPkt:vector"];
const READY_METRIC: &str = "globalSchedulerReady:vector";

pub fn run(campaign: &Campaign) -> Result<RunSummary> {
    let pattern = RunPattern::failure()?;
    let metrics = campaign.metrics_or(&DATA_METRICS);

    let link_dir = campaign.results_dir.join("LinkFailure");
    let node_dir = campaign.results_dir.join("NodeFailure");

    let mut summary = RunSummary::new("failure");
    collect_data(
        campaign,
        &link_dir,
        &pattern,
        &metrics,
        "link_failure_data.csv",
        &mut summary,
    )?;
    collect_data(
        campaign,
        &node_dir,
        &pattern,
        &metrics,
        "node_failure_data.csv",
        &mut summary,
    )?;
    collect_recovery(
        campaign,
        &link_dir,
        &pattern,
        "link_recovery_time.csv",
        &mut summary,
    )?;
    collect_recovery(
        campaign,
        &node_dir,
        &pattern,
        "node_recovery_time.csv",
        &mut summary,
    )?;
    Ok(summary)
}

/// Sum each metric per whole second, one row per (run, second).
fn collect_data(
    campaign: &Campaign,
    input_dir: &Path,
    pattern: &RunPattern,
    metrics: &[String],
    out_name: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    let files = result_files(input_dir, "vec")?;
    summary.files_seen += files.len();

    let out_path = campaign.out_dir.join(out_name);
    let mut header = vec!["time".to_string(), "routeUpdate".to_string(), "errorProb".to_string()];
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
        let route_update = params.get("route_update").unwrap_or("Unknown");
        let error_prob = params.get("error_prob").unwrap_or("Unknown");

        let ids = read_index_declarations(&path.with_extension("vci"), metrics)?;
        let queries: Vec<VectorQuery> = metrics
            .iter()
            .map(|name| VectorQuery::new(name, Accumulate::SumPerSecond))
            .collect();
        let data = read_samples(path, &ids, &queries)?;

        let table = MetricTable::from_series(&data, metrics);
        for (time, cells) in table.rows() {
            let mut row = vec![
                format_time(time, TimeFormat::Seconds),
                route_update.to_string(),
                error_prob.to_string(),
            ];
            row.extend(cells.iter().map(|v| format_value(*v)));
            sink.write_row(row)?;
        }
    }

    let rows = sink.finish()?;
    summary.record(&out_path, matched, rows);
    Ok(())
}

/// Distinct values of the scheduler-ready vector for the runs that have
/// route updates enabled. The values are recovery durations; times are
/// irrelevant here.
fn collect_recovery(
    campaign: &Campaign,
    input_dir: &Path,
    pattern: &RunPattern,
    out_name: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    let files = result_files(input_dir, "vec")?;

    let out_path = campaign.out_dir.join(out_name);
    let mut sink = CsvSink::create(&out_path, &["error_prob", "recovery_time"])?;
    let allow = [READY_METRIC.to_string()];
    let queries = [VectorQuery::new(READY_METRIC, Accumulate::Collect)];

    let mut matched = 0;
    for path in &files {
        let Some(params) = file_name(path).and_then(|name| pattern.captures(name)) else {
            continue;
        };
        if params.get("route_update") != Some("true") {
            continue;
        }
        matched += 1;
        let error_prob = params.get("error_prob").unwrap_or("Unknown");

        let ids = read_index_declarations(&path.with_extension("vci"), &allow)?;
        let data = read_samples(path, &ids, &queries)?;

        let mut values = data.collected(READY_METRIC).to_vec();
        values.sort_by(f64::total_cmp);
        values.dedup();
        for value in values {
            let formatted = format_value(value);
            sink.write_row([error_prob, formatted.as_str()])?;
        }
    }

    let rows = sink.finish()?;
    summary.record(&out_path, matched, rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_run(dir: &Path, stem: &str, vec_body: &str, vci_body: &str) {
        fs::write(dir.join(format!("{stem}.vec")), vec_body).unwrap();
        fs::write(dir.join(format!("{stem}.vci")), vci_body).unwrap();
    }

    #[test]
    fn sums_per_second_and_reads_index_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        let link_dir = results.join("LinkFailure");
        fs::create_dir_all(&link_dir).unwrap();
        fs::create_dir_all(results.join("NodeFailure")).unwrap();

        write_run(
            &link_dir,
            "FastSA-routeUpdate-false-errorProb-0.2",
            "\
version 2
1 10 70.058 29
1 11 70.900 1
2 12 70.500 5
1 13 72.000 4
",
            "\
version 2
vector 1 VEC.scheduler utility:vector ETV
1 566 1024 0 10 2 13 70.058 72.0 29 34 63
vector 2 VEC.scheduler meetDlPkt:vector ETV
2 1590 512 0 5 14 14 70.5 70.5 5 5 5
",
        );

        let campaign = Campaign::resolve(
            results.to_str().unwrap(),
            dir.path().join("analysis").to_str().unwrap(),
            None,
            None,
            None,
        )
        .unwrap();
        run(&campaign).unwrap();

        let csv = fs::read_to_string(campaign.out_dir.join("link_failure_data.csv")).unwrap();
        assert_eq!(
            csv,
            "time,routeUpdate,errorProb,utility:vector,meetDlPkt:vector\n\
             70,false,0.2,30,5\n\
             72,false,0.2,4,0\n"
        );
    }

    #[test]
    fn recovery_times_only_for_route_updating_runs() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        let link_dir = results.join("LinkFailure");
        fs::create_dir_all(&link_dir).unwrap();
        fs::create_dir_all(results.join("NodeFailure")).unwrap();

        let vci = "vector 0 VEC.scheduler globalSchedulerReady:vector ETV\n";
        write_run(
            &link_dir,
            "FastSA-routeUpdate-true-errorProb-0.1",
            "0 1 100.0 2.5\n0 2 200.0 0.75\n0 3 300.0 2.5\n",
            vci,
        );
        write_run(
            &link_dir,
            "FastSA-routeUpdate-false-errorProb-0.1",
            "0 1 100.0 9.0\n",
            vci,
        );

        let campaign = Campaign::resolve(
            results.to_str().unwrap(),
            dir.path().join("analysis").to_str().unwrap(),
            None,
            None,
            None,
        )
        .unwrap();
        run(&campaign).unwrap();

        let csv = fs::read_to_string(campaign.out_dir.join("link_recovery_time.csv")).unwrap();
        assert_eq!(
            csv,
            "error_prob,recovery_time\n\
             0.1,0.75\n\
             0.1,2.5\n"
        );
    }
}
