//! Error handling for indicator ingestion.
//!
//! Only directory-level failures, configuration problems and export failures
//! surface as errors. Per-file and per-row problems are downgraded to
//! [`crate::models::SkipReason`]s inside the load report.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Data directory could not be listed: {path} - {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Unreadable file: {path} - {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Invalid configuration file: {path} - {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Export failed for {path}: {reason}")]
    Export { path: PathBuf, reason: String },
}

impl IngestError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
