//! Core library for pagebridge - a dev-server bridge for file-based
//! serverless functions.
//!
//! This crate holds the pure, synchronous parts of the bridge:
//!
//! - [`options`]: the typed configuration surface and the tagged
//!   [`options::OptionValue`] mapping derived from it
//! - [`args`]: translation of an option mapping into emulator CLI arguments
//! - [`discovery`]: static analysis of handler source files to recover
//!   their exported names, without executing them
//! - [`routes`]: synthesis of URL route patterns from file paths and
//!   export sets, plus prefix-mount pattern matching
//!
//! Process supervision and request proxying live in the `pagebridge-cli`
//! crate, which drives this one.

pub mod args;
pub mod discovery;
pub mod error;
pub mod options;
pub mod routes;

pub use args::to_cli_args;
pub use discovery::{collect_exports, handler_files};
pub use error::{CoreError, Result};
pub use options::{BridgeOptions, LogLevel, OptionValue};
pub use routes::{synthesize, RouteDescriptor, RoutePattern};
