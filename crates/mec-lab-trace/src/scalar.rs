use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TraceError};

/// Fallback when a run carries no `sim-time-limit` config line.
pub const DEFAULT_SIM_TIME_LIMIT: f64 = 900.0;

/// How repeated occurrences of the same scalar name (one per module
/// instance) are reduced to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarMode {
    /// First occurrence wins.
    First,
    /// Occurrences are summed across module instances.
    Sum,
}

/// Treatment of non-finite scalar values (`-nan` in the trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// A non-finite occurrence counts as "no data" and is dropped.
    Skip,
    /// Non-finite occurrences are recorded like any other value.
    Keep,
}

#[derive(Debug, Clone)]
pub struct ScalarQuery {
    pub name: String,
    pub mode: ScalarMode,
    pub nan: NanPolicy,
}

impl ScalarQuery {
    pub fn new(name: &str, mode: ScalarMode, nan: NanPolicy) -> Self {
        Self {
            name: name.to_string(),
            mode,
            nan,
        }
    }
}

/// All occurrences of one queried scalar, after the query's NaN policy.
#[derive(Debug, Clone, Default)]
pub struct ScalarReading {
    pub occurrences: Vec<f64>,
}

impl ScalarReading {
    pub fn first(&self) -> Option<f64> {
        self.occurrences.first().copied()
    }

    pub fn sum(&self) -> f64 {
        self.occurrences.iter().sum()
    }

    /// Reduce the occurrences according to the query mode. `None` when the
    /// metric never appeared (or every occurrence was skipped).
    pub fn reduce(&self, mode: ScalarMode) -> Option<f64> {
        match mode {
            ScalarMode::First => self.first(),
            ScalarMode::Sum => (!self.occurrences.is_empty()).then(|| self.sum()),
        }
    }
}

/// Result of one pass over a `.sca` file.
#[derive(Debug, Clone)]
pub struct ScalarScan {
    pub readings: BTreeMap<String, ScalarReading>,
    /// Seconds, from the first `config sim-time-limit <N>s` line.
    pub sim_time_limit: f64,
}

impl ScalarScan {
    pub fn reading(&self, name: &str) -> ScalarReading {
        self.readings.get(name).cloned().unwrap_or_default()
    }

    /// Read a scalar file in a single pass, collecting every occurrence of
    /// the queried names. Lines are `scalar <module> <name> <value>`; any
    /// other line kind except `config` is ignored.
    pub fn read(path: &Path, queries: &[ScalarQuery]) -> Result<Self> {
        let file = File::open(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut scan = ScalarScan {
            readings: BTreeMap::new(),
            sim_time_limit: DEFAULT_SIM_TIME_LIMIT,
        };
        let mut found_time_limit = false;

        for line in reader.lines() {
            let line = line.map_err(|source| TraceError::Read {
                path: path.to_path_buf(),
                source,
            })?;

            if line.starts_with("config") && !found_time_limit {
                // e.g. `config sim-time-limit 900s`
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 3 && parts[1] == "sim-time-limit" {
                    if let Some(seconds) = parts[2].strip_suffix('s') {
                        if let Ok(seconds) = seconds.parse::<f64>() {
                            scan.sim_time_limit = seconds;
                            found_time_limit = true;
                        }
                    }
                }
                continue;
            }

            if !line.starts_with("scalar") {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                continue;
            }
            let name = parts[2];
            let Some(query) = queries.iter().find(|q| q.name == name) else {
                continue;
            };
            let Ok(value) = parts[3].parse::<f64>() else {
                debug!(file = %path.display(), name, raw = parts[3], "unparseable scalar value");
                continue;
            };
            if !value.is_finite() && query.nan == NanPolicy::Skip {
                debug!(file = %path.display(), name, "skipping non-finite scalar");
                continue;
            }
            scan.readings
                .entry(name.to_string())
                .or_default()
                .occurrences
                .push(value);
        }

        Ok(scan)
    }
}
