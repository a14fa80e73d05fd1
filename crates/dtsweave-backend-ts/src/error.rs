//! Error types for the TypeScript backend.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("File discovery failed: {message}")]
    Discovery { message: String },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error(transparent)]
    Core(#[from] dtsweave_core::Error),
}

impl BackendError {
    /// Whether the error comes from the run's configuration rather than the
    /// files being bundled.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BackendError::Core(e) if e.is_configuration())
            || matches!(self, BackendError::Pattern { .. })
    }
}
