//! Unified error types for the enrichment engine.
//!
//! Only run-aborting conditions live here. Per-item fetch failures are
//! [`crate::FetchError`] and are always recovered inside the worker pool.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the enrichment engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input file not found: {}", path.display())]
    InputMissing { path: PathBuf },

    #[error("failed to read input {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input {} is not a list of records: {reason}", path.display())]
    InputInvalid { path: PathBuf, reason: String },

    #[error("failed to write output {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn input_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InputInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn output_write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OutputWrite {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the input file rather than the engine.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputMissing { .. } | Self::InputRead { .. } | Self::InputInvalid { .. }
        )
    }
}
