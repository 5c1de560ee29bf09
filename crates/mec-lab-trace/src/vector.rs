use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TraceError};

/// Sample time usable as an ordered map key. `.vec` times are well-behaved
/// finite floats; ordering falls back to `total_cmp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeKey(pub f64);

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// How samples of one vector are folded while streaming the file body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accumulate {
    /// Keyed by exact sample time; a later duplicate time overwrites.
    LastWins,
    /// Keyed by the sample time truncated to whole seconds; a later sample
    /// in the same second overwrites.
    LastWinsPerSecond,
    /// Keyed by the sample time truncated to whole seconds; values summed.
    SumPerSecond,
    /// Keyed by `floor(t / width) * width + offset`; values summed. Read
    /// back with [`VectorData::bucket_rate`] to get a per-second average.
    Bucketed { width: f64, offset: f64 },
    /// No keying at all: the raw sample values, order not preserved.
    Collect,
}

#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub name: String,
    pub acc: Accumulate,
}

impl VectorQuery {
    pub fn new(name: &str, acc: Accumulate) -> Self {
        Self {
            name: name.to_string(),
            acc,
        }
    }
}

/// Accumulated samples per queried vector name.
#[derive(Debug, Clone, Default)]
pub struct VectorData {
    series: BTreeMap<String, BTreeMap<TimeKey, f64>>,
    collected: BTreeMap<String, Vec<f64>>,
}

impl VectorData {
    pub fn series(&self, name: &str) -> Option<&BTreeMap<TimeKey, f64>> {
        self.series.get(name)
    }

    pub fn value_at(&self, name: &str, time: TimeKey) -> Option<f64> {
        self.series.get(name)?.get(&time).copied()
    }

    /// Bucket sum divided by the bucket width, i.e. the average rate over
    /// the bucket. Missing buckets read as 0.
    pub fn bucket_rate(&self, name: &str, time: TimeKey, width: f64) -> f64 {
        self.value_at(name, time).unwrap_or(0.0) / width
    }

    pub fn collected(&self, name: &str) -> &[f64] {
        self.collected.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorted union of the time keys of the given series.
    pub fn time_keys(&self, names: &[String]) -> Vec<TimeKey> {
        let mut keys: Vec<TimeKey> = names
            .iter()
            .filter_map(|name| self.series.get(name))
            .flat_map(|points| points.keys().copied())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Map the declarations in a `.vec` header to the queried metric names.
///
/// Declarations are `vector <id> <module> <name> <type>` lines preceding
/// the body; the first sample line ends the scan.
pub fn read_declarations(path: &Path, allow: &[String]) -> Result<HashMap<u32, String>> {
    scan_declarations(path, allow, true)
}

/// Map the declarations in a `.vci` index file to the queried metric names.
///
/// Index files interleave numeric per-vector block lines between the
/// declarations, so the whole file is scanned.
pub fn read_index_declarations(path: &Path, allow: &[String]) -> Result<HashMap<u32, String>> {
    scan_declarations(path, allow, false)
}

fn scan_declarations(
    path: &Path,
    allow: &[String],
    stop_at_samples: bool,
) -> Result<HashMap<u32, String>> {
    let file = File::open(path).map_err(|source| TraceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut ids = HashMap::new();
    for line in reader.lines() {
        let line = line.map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.starts_with("vector") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 {
                if let Ok(id) = parts[1].parse::<u32>() {
                    if let Some(name) = allow.iter().find(|name| name.as_str() == parts[3]) {
                        ids.insert(id, name.clone());
                    }
                }
            }
        } else if stop_at_samples && parse_sample(&line).is_some() {
            break;
        }
    }
    Ok(ids)
}

/// Stream the sample body of a `.vec` file, folding each sample into the
/// accumulator of the query its id maps to. Ids absent from `ids`
/// contribute nothing.
pub fn read_samples(
    path: &Path,
    ids: &HashMap<u32, String>,
    queries: &[VectorQuery],
) -> Result<VectorData> {
    let file = File::open(path).map_err(|source| TraceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut data = VectorData::default();
    for line in reader.lines() {
        let line = line.map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let Some((id, time, value)) = parse_sample(&line) else {
            continue;
        };
        let Some(name) = ids.get(&id) else {
            continue;
        };
        let Some(query) = queries.iter().find(|q| &q.name == name) else {
            continue;
        };
        if !value.is_finite() {
            debug!(file = %path.display(), name, time, "dropping non-finite sample");
            continue;
        }
        match query.acc {
            Accumulate::LastWins => {
                data.series
                    .entry(name.clone())
                    .or_default()
                    .insert(TimeKey(time), value);
            }
            Accumulate::LastWinsPerSecond => {
                data.series
                    .entry(name.clone())
                    .or_default()
                    .insert(TimeKey(time.trunc()), value);
            }
            Accumulate::SumPerSecond => {
                *data
                    .series
                    .entry(name.clone())
                    .or_default()
                    .entry(TimeKey(time.trunc()))
                    .or_insert(0.0) += value;
            }
            Accumulate::Bucketed { width, offset } => {
                let bucket = (time / width).floor() * width + offset;
                *data
                    .series
                    .entry(name.clone())
                    .or_default()
                    .entry(TimeKey(bucket))
                    .or_insert(0.0) += value;
            }
            Accumulate::Collect => {
                data.collected.entry(name.clone()).or_default().push(value);
            }
        }
    }
    Ok(data)
}

/// `<id> <eventId> <time> <value>` with an integer id and event id. Returns
/// `None` for declaration, attribute, and blank lines.
fn parse_sample(line: &str) -> Option<(u32, f64, f64)> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?.parse::<u32>().ok()?;
    let _event_id = parts.next()?.parse::<u64>().ok()?;
    let time = parts.next()?.parse::<f64>().ok()?;
    let value = parts.next()?.parse::<f64>().ok()?;
    Some((id, time, value))
}
