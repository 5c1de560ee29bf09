use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use mec_lab_trace::{NanPolicy, ScalarMode};

/// Optional TOML file overriding a campaign's defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignOverride {
    pub results_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// Replacement metric allow-list, for the campaigns that take one.
    pub metrics: Option<Vec<String>>,
    /// Occurrence reduction for the campaign's scalar queries
    /// (`"first"` or `"sum"`).
    pub scalar_mode: Option<ScalarMode>,
    /// `-nan` handling for the campaign's scalar queries
    /// (`"skip"` or `"keep"`).
    pub nan_policy: Option<NanPolicy>,
}

impl CampaignOverride {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read campaign file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse campaign file")
    }
}

/// Resolved input/output locations for one extraction campaign.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub results_dir: PathBuf,
    pub out_dir: PathBuf,
    pub metrics: Option<Vec<String>>,
    pub scalar_mode: Option<ScalarMode>,
    pub nan_policy: Option<NanPolicy>,
}

impl Campaign {
    pub fn resolve(
        default_results: &str,
        default_out: &str,
        results_dir: Option<PathBuf>,
        out_dir: Option<PathBuf>,
        overrides: Option<CampaignOverride>,
    ) -> Result<Self> {
        let overrides = overrides.unwrap_or_default();
        let results_dir = results_dir
            .or(overrides.results_dir)
            .unwrap_or_else(|| PathBuf::from(default_results));
        let out_dir = out_dir
            .or(overrides.out_dir)
            .unwrap_or_else(|| PathBuf::from(default_out));

        anyhow::ensure!(
            results_dir.is_dir(),
            "results directory {} does not exist",
            results_dir.display()
        );
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        Ok(Self {
            results_dir,
            out_dir,
            metrics: overrides.metrics,
            scalar_mode: overrides.scalar_mode,
            nan_policy: overrides.nan_policy,
        })
    }

    /// The campaign's metric allow-list, override first.
    pub fn metrics_or(&self, default: &[&str]) -> Vec<String> {
        self.metrics
            .clone()
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
    }

    /// Scalar occurrence reduction, override first.
    pub fn scalar_mode_or(&self, default: ScalarMode) -> ScalarMode {
        self.scalar_mode.unwrap_or(default)
    }

    /// `-nan` handling, override first.
    pub fn nan_policy_or(&self, default: NanPolicy) -> NanPolicy {
        self.nan_policy.unwrap_or(default)
    }
}

/// Result files with the given extension, in sorted order so reruns emit
/// byte-identical CSVs.
pub fn result_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read results directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Filename as UTF-8, for matching against a [`mec_lab_trace::RunPattern`].
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

#[derive(Debug, Serialize)]
pub struct OutputReport {
    pub path: PathBuf,
    pub files_matched: usize,
    pub rows: usize,
}

/// What one fetch invocation scanned and produced, written as JSON when
/// `--summary-out` is given.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub campaign: &'static str,
    pub files_seen: usize,
    pub outputs: Vec<OutputReport>,
}

impl RunSummary {
    pub fn new(campaign: &'static str) -> Self {
        Self {
            campaign,
            files_seen: 0,
            outputs: Vec::new(),
        }
    }

    pub fn record(&mut self, path: &Path, files_matched: usize, rows: usize) {
        info!(
            output = %path.display(),
            files_matched, rows, "extraction complete"
        );
        self.outputs.push(OutputReport {
            path: path.to_path_buf(),
            files_matched,
            rows,
        });
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self).context("Failed to serialize run summary")?;
        fs::write(path, &data)
            .with_context(|| format!("Failed to write run summary {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn override_file_parses_scalar_handling() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "metrics = [\"utility:sum\"]\n\
             scalar_mode = \"sum\"\n\
             nan_policy = \"keep\"\n"
        )
        .unwrap();
        let overrides = CampaignOverride::load(file.path()).unwrap();
        assert_eq!(overrides.scalar_mode, Some(ScalarMode::Sum));
        assert_eq!(overrides.nan_policy, Some(NanPolicy::Keep));
        assert_eq!(overrides.metrics, Some(vec!["utility:sum".to_string()]));
    }

    #[test]
    fn unknown_override_field_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "metrcs = [\"utility:sum\"]\n").unwrap();
        assert!(CampaignOverride::load(file.path()).is_err());
    }
}
