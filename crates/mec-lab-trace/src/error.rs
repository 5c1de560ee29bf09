use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid extraction rule `{pattern}`")]
    Rule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("extraction rule `{pattern}` has no named capture group")]
    MissingCapture { pattern: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;
