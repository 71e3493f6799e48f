//! Error types for survey loading, configuration and report output.

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures. Malformed headers and answers are never errors;
/// they are excluded and reported instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("survey file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The input has no header row at all.
    #[error("survey file has no header row: {path}")]
    EmptyInput { path: PathBuf },

    #[error("column '{column}' not found in survey table")]
    ColumnNotFound { column: String },

    #[error("no survey column carries variable code '{code}'")]
    UnknownVariable { code: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
