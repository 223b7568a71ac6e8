//! Error types for the core library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by discovery, synthesis, and option validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A handler source file could not be read.
    #[error("Failed to read {}: {error}", .path.display())]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        error: std::io::Error,
    },

    /// A handler source file could not be parsed.
    #[error("Failed to parse {}:\n{}", .path.display(), .messages.join("\n"))]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser diagnostics, in source order
        messages: Vec<String>,
    },

    /// A configuration option failed boundary validation.
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidOption {
        /// Name of the offending option
        field: String,
        /// The rejected value
        value: String,
        /// Guidance for fixing the value
        hint: String,
    },
}

/// Result type alias using [`CoreError`] as the default error type.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
