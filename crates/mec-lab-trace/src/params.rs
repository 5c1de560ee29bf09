use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Result, TraceError};

/// Experiment parameters recovered from a result filename.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunParams(BTreeMap<String, String>);

impl RunParams {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(|v| v.parse().ok())
    }

    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(|v| v.parse().ok())
    }

    fn insert(&mut self, field: &str, value: &str) {
        // Probabilities captured with `[0-9.]+` can pick up a stray
        // trailing dot from the decimal formatting of the run label.
        let value = value.strip_suffix('.').unwrap_or(value);
        self.0.insert(field.to_string(), value.to_string());
    }
}

/// A declarative filename convention: a set of extraction rules, each a
/// regex with named capture groups. A filename matches the pattern only if
/// every rule matches; the captured fields of all rules are merged.
#[derive(Debug, Clone)]
pub struct RunPattern {
    name: &'static str,
    rules: Vec<Regex>,
}

impl RunPattern {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Add an extraction rule. The pattern must contain at least one named
    /// capture group; each group becomes a field of the extracted params.
    pub fn rule(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| TraceError::Rule {
            pattern: pattern.to_string(),
            source,
        })?;
        if regex.capture_names().flatten().next().is_none() {
            return Err(TraceError::MissingCapture {
                pattern: pattern.to_string(),
            });
        }
        self.rules.push(regex);
        Ok(self)
    }

    /// Match a filename against every rule. `None` means the file does not
    /// follow this naming convention and should be skipped.
    pub fn captures(&self, filename: &str) -> Option<RunParams> {
        let mut params = RunParams::default();
        for rule in &self.rules {
            let caps = rule.captures(filename)?;
            for field in rule.capture_names().flatten() {
                let value = caps.name(field)?;
                params.insert(field, value.as_str());
            }
        }
        Some(params)
    }

    /// `Algo-interval-N-appCount-M.{sca,vec}`
    pub fn interval_app_count() -> Result<Self> {
        Self::new("interval-appCount")
            .rule(r"^(?P<algorithm>[^-]+)-interval-(?P<interval>[0-9]+)-appCount-(?P<app_count>[0-9]+)")
    }

    /// `scheme-ALGO-appCount-N.{sca,vec}`
    pub fn scheme_app_count() -> Result<Self> {
        Self::new("scheme-appCount")
            .rule(r"^scheme-(?P<algorithm>[^-]+)-appCount-(?P<app_count>[0-9]+)")
    }

    /// `...routeUpdate-BOOL-errorProb-P...`
    pub fn failure() -> Result<Self> {
        Self::new("routeUpdate-errorProb")
            .rule(r"routeUpdate-(?P<route_update>[A-Za-z]+)-errorProb-(?P<error_prob>[0-9.]+)")
    }

    /// `...scheAll-B...countExeTime-B-ALGO...pilot-P...`: the fields sit at
    /// scattered positions, so each gets its own rule.
    pub fn sche_exe_time() -> Result<Self> {
        Self::new("scheAll-countExeTime")
            .rule(r"scheAll-(?P<sche_all>[^-\s]+)")?
            .rule(r"countExeTime-(?P<count_exe_time>[^-\s]+)")?
            .rule(r"countExeTime-[^-]+-(?P<algorithm>[^-.]+)")?
            .rule(r"pilot-(?P<pilot>[^-.\s]+)")
    }

    /// `...scheAll-B...factor-F-ALGO...pilot-P...`
    pub fn sche_factor() -> Result<Self> {
        Self::new("scheAll-factor")
            .rule(r"scheAll-(?P<sche_all>[^-\s]+)")?
            .rule(r"factor-(?P<factor>[^-]+)")?
            .rule(r"factor-[^-]+-(?P<algorithm>[^-.]+)")?
            .rule(r"pilot-(?P<pilot>[^-.\s]+)")
    }
}
