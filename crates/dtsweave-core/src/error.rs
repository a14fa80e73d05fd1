//! Error types for dtsweave core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dtsweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a bundling run.
///
/// Recoverable problems (unresolvable specifiers, unrecognized statements)
/// are never errors; they are reported as [`crate::Diagnostic`]s alongside
/// the output.
#[derive(Debug, Error)]
pub enum Error {
    /// The run was configured with options that cannot be satisfied.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A declaration file could not be parsed at all.
    #[error("Parse error in {file}: {message}")]
    Parse {
        /// File that failed to parse.
        file: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Graph too large for cycle detection
    #[error("Graph has {module_count} modules, max allowed is {max_allowed}")]
    GraphTooLarge {
        module_count: usize,
        max_allowed: usize,
    },

    /// Import cycle search recursed too deep
    #[error("Circular dependency depth {depth} exceeds max {max_allowed}")]
    CycleTooDeep {
        depth: usize,
        max_allowed: usize,
    },
}

/// Fatal configuration errors, reported before any output is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The entry file is not among the supplied modules.
    #[error("Entry module not found among the bundled files: {entry}")]
    EntryModuleNotFound {
        /// The entry path as configured.
        entry: PathBuf,
    },

    /// The requested entry export is not exported by the entry module.
    #[error("Export '{export}' is not exported by {entry}")]
    EntryExportNotFound {
        /// The entry module.
        entry: PathBuf,
        /// The requested export name.
        export: String,
    },

    /// An option value is unusable.
    #[error("Invalid option '{option}': {reason}")]
    InvalidOption {
        /// Option name.
        option: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl Error {
    /// Returns true when the error was caused by the run configuration rather
    /// than by the input files.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
