//! Error handling for the pagebridge CLI.
//!
//! Top-level [`CliError`] categories convert automatically from the
//! domain-specific errors via `#[from]`; `main` renders the final error
//! through miette.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Handler discovery and route synthesis errors
    #[error("{0}")]
    Core(#[from] pagebridge_core::CoreError),

    /// Emulator supervision errors
    #[error("Emulator error: {0}")]
    Emulator(#[from] EmulatorError),

    /// Dev server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be loaded
    #[error("Invalid config file {}: {error}\n\nHint: check pagebridge.config.json syntax and field types", .path.display())]
    Invalid {
        /// Path of the config file
        path: PathBuf,
        /// Formatted loader error
        error: String,
    },

    /// Explicitly requested config file doesn't exist
    #[error("Config file not found: {}\n\nHint: create the file or drop the --config flag", .0.display())]
    NotFound(PathBuf),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Emulator supervision errors. All of these are fatal to startup.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// The emulator binary could not be spawned
    #[error("Failed to spawn emulator '{command}': {error}\n\nHint: ensure the emulator binary is installed and on PATH")]
    Spawn {
        /// The binary that failed to spawn
        command: String,
        /// Underlying spawn error
        #[source]
        error: std::io::Error,
    },

    /// No readiness message arrived within the startup timeout
    #[error("Timed out waiting for the emulator to report its address\n\nHint: check the emulator log output above for startup failures")]
    StartupTimeout,

    /// The first readiness message was not a valid `{ip, port}` object
    #[error("Malformed readiness message from the emulator: {0}")]
    MalformedReadiness(String),

    /// The readiness channel itself failed
    #[error("Readiness channel error: {0}")]
    Ipc(std::io::Error),
}

/// Result type alias using [`CliError`] as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Convert a [`CliError`] to a miette report for terminal rendering.
pub fn to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Core(e) => miette::miette!("Discovery error: {}", e),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_hint() {
        let err = ConfigError::NotFound(PathBuf::from("pagebridge.config.json"));
        let msg = err.to_string();
        assert!(msg.contains("Config file not found"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn emulator_errors_convert_to_cli_error() {
        let cli_err: CliError = EmulatorError::StartupTimeout.into();
        assert!(matches!(cli_err, CliError::Emulator(_)));
        assert!(cli_err.to_string().contains("Timed out"));
    }

    #[test]
    fn core_errors_convert_to_cli_error() {
        let core_err = pagebridge_core::CoreError::Parse {
            path: PathBuf::from("functions/index.ts"),
            messages: vec!["Unexpected token".to_string()],
        };
        let cli_err: CliError = core_err.into();
        assert!(cli_err.to_string().contains("functions/index.ts"));
    }
}
