//! Error types for loading and exporting usage overlays.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing usage documents.
#[derive(Debug, Error)]
pub enum UsageError {
    /// File I/O failure.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`UsageError`].
pub type Result<T> = std::result::Result<T, UsageError>;
