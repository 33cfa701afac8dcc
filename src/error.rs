use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load-time errors
// ---------------------------------------------------------------------------

/// Failure to load a metadata table.  Fatal at startup: nothing can be shown
/// without a table whose schema is intact.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unreadable Arrow column: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("table has no category columns (expected columns after position {0})")]
    NoCategories(usize),

    #[error("row {row}: score '{value}' for category '{category}' is not in [0, 1]")]
    InvalidScore {
        row: usize,
        category: String,
        value: String,
    },

    #[error("row {row}: expected {expected} category scores, found {found}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Caller contract violations
// ---------------------------------------------------------------------------

/// Rejected filter request.  These indicate a programming error in the caller
/// and never degrade into an empty result.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),
}

// ---------------------------------------------------------------------------
// Per-asset fetch failures
// ---------------------------------------------------------------------------

/// Why a single asset could not be produced.
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unrecognized video container")]
    UnknownVideoContainer,

    #[error("empty response body")]
    EmptyBody,

    #[error("cannot read response body: {0}")]
    Body(#[source] io::Error),
}

/// A fetch that failed.  Carries the offending URL so the caller can report it
/// next to the item and continue with the rest of the batch.
#[derive(Debug, Error)]
#[error("cannot fetch {url}: {cause}")]
pub struct FetchFailure {
    pub url: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
