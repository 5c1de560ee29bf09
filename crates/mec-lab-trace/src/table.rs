use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Result, TraceError};
use crate::vector::{TimeKey, VectorData};

/// How the time key column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Whole seconds, e.g. `70`.
    Seconds,
    /// The exact sample time, e.g. `70.058`.
    Exact,
}

pub fn format_time(time: TimeKey, format: TimeFormat) -> String {
    match format {
        TimeFormat::Seconds => format!("{}", time.0 as i64),
        TimeFormat::Exact => format!("{}", time.0),
    }
}

pub fn format_value(value: f64) -> String {
    format!("{value}")
}

/// One row per distinct time key, one column per metric, `0` filled in
/// where a metric has no sample at that key.
#[derive(Debug, Clone)]
pub struct MetricTable {
    metrics: Vec<String>,
    rows: BTreeMap<TimeKey, Vec<f64>>,
}

impl MetricTable {
    pub fn from_series(data: &VectorData, metrics: &[String]) -> Self {
        let mut rows = BTreeMap::new();
        for time in data.time_keys(metrics) {
            let cells = metrics
                .iter()
                .map(|name| data.value_at(name, time).unwrap_or(0.0))
                .collect();
            rows.insert(time, cells);
        }
        Self {
            metrics: metrics.to_vec(),
            rows,
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending time order.
    pub fn rows(&self) -> impl Iterator<Item = (TimeKey, &[f64])> {
        self.rows.iter().map(|(time, cells)| (*time, cells.as_slice()))
    }
}

/// CSV output with an explicit header, written through the `csv` crate.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path).map_err(|source| TraceError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        writer
            .write_record(header)
            .map_err(|source| TraceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write_row<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(|source| TraceError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|source| TraceError::Write {
            path: self.path.clone(),
            source: source.into(),
        })?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::vector::{Accumulate, VectorQuery, read_declarations, read_samples};

    const TRACE: &str = "\
vector 0 VEC.scheduler utility:vector ETV
vector 1 VEC.scheduler other:vector ETV
vector 2 VEC.scheduler meetDlPkt:vector ETV
0 100 5.0 42.0
1 100 5.0 99.0
2 101 7.0 3.0
";

    fn extract(path: &Path) -> (MetricTable, Vec<String>) {
        let metrics = vec!["utility:vector".to_string(), "meetDlPkt:vector".to_string()];
        let ids = read_declarations(path, &metrics).unwrap();
        let queries: Vec<VectorQuery> = metrics
            .iter()
            .map(|name| VectorQuery::new(name, Accumulate::LastWins))
            .collect();
        let data = read_samples(path, &ids, &queries).unwrap();
        (MetricTable::from_series(&data, &metrics), metrics)
    }

    fn write_table(table: &MetricTable, path: &Path, metrics: &[String]) {
        let mut header = vec!["time"];
        header.extend(metrics.iter().map(String::as_str));
        let mut sink = CsvSink::create(path, &header).unwrap();
        for (time, cells) in table.rows() {
            let mut row = vec![format_time(time, TimeFormat::Exact)];
            row.extend(cells.iter().map(|v| format_value(*v)));
            sink.write_row(row).unwrap();
        }
        sink.finish().unwrap();
    }

    #[test]
    fn expected_cells_and_zero_fill() {
        let mut trace = tempfile::NamedTempFile::new().unwrap();
        trace.write_all(TRACE.as_bytes()).unwrap();
        let (table, _) = extract(trace.path());

        let rows: HashMap<String, Vec<f64>> = table
            .rows()
            .map(|(t, cells)| (format_time(t, TimeFormat::Exact), cells.to_vec()))
            .collect();
        // Row for t=5.0 carries utility 42 and no contribution from id 1.
        assert_eq!(rows["5"], vec![42.0, 0.0]);
        // meetDlPkt only exists at t=7.0; utility zero-fills there.
        assert_eq!(rows["7"], vec![0.0, 3.0]);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let mut trace = tempfile::NamedTempFile::new().unwrap();
        trace.write_all(TRACE.as_bytes()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        for out in [&first, &second] {
            let (table, metrics) = extract(trace.path());
            write_table(&table, out, &metrics);
        }
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }
}
