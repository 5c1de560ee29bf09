//! Shared parsing and aggregation core for OMNeT++-style simulation
//! results: `.sca` scalar files, `.vec`/`.vci` vector files, filename
//! parameter conventions, and CSV table emission.

pub mod error;
pub mod params;
pub mod scalar;
pub mod table;
pub mod vector;

pub use error::TraceError;
pub use params::{RunParams, RunPattern};
pub use scalar::{NanPolicy, ScalarMode, ScalarQuery, ScalarReading, ScalarScan};
pub use table::{CsvSink, MetricTable, TimeFormat, format_time, format_value};
pub use vector::{
    Accumulate, TimeKey, VectorData, VectorQuery, read_declarations, read_index_declarations,
    read_samples,
};
