//! Logging infrastructure for the pagebridge CLI.
//!
//! Structured logging via the `tracing` ecosystem with verbosity flags and
//! `RUST_LOG` overrides. Emulator output is forwarded through the
//! `emulator` target so it can be filtered independently.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with the specified options.
///
/// Call once at program start, before any logging occurs.
///
/// Verbosity is decided in this order: `--verbose` (debug for pagebridge
/// crates), `--quiet` (errors only), `RUST_LOG`, default (info).
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("pagebridge_core=debug,pagebridge_cli=debug,emulator=debug")
    } else if quiet {
        EnvFilter::new("pagebridge_cli=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pagebridge_core=info,pagebridge_cli=info,emulator=info")
        })
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
