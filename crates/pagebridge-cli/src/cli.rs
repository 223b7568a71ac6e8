//! Command-line interface definition for pagebridge.
//!
//! Defined with clap v4 derive macros.
//!
//! # Command Structure
//!
//! - `pagebridge dev` - Start the dev server and the functions emulator
//! - `pagebridge routes` - List the routes synthesized from the functions root

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// pagebridge - dev server bridge for file-based serverless functions
#[derive(Parser, Debug)]
#[command(
    name = "pagebridge",
    version,
    about = "Dev server bridge for file-based serverless functions",
    long_about = "pagebridge supervises a local functions emulator, discovers file-based\n\
                  HTTP handlers in your functions directory, and transparently proxies\n\
                  matching requests from the dev server to the emulator."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the dev server and the functions emulator
    Dev(DevArgs),

    /// List the routes synthesized from the functions root, without
    /// starting anything
    Routes(RoutesArgs),
}

/// Arguments for the `dev` command.
#[derive(Args, Debug, Clone)]
pub struct DevArgs {
    /// Directory scanned recursively for handler files
    #[arg(long, default_value = "functions")]
    pub functions_dir: PathBuf,

    /// Static assets directory, served by the dev server and passed to
    /// the emulator
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Port for the dev server
    #[arg(short, long, default_value_t = 8788)]
    pub port: u16,

    /// Emulator binary to spawn
    #[arg(long, default_value = "wrangler")]
    pub emulator: String,

    /// Path to the config file (defaults to pagebridge.config.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `routes` command.
#[derive(Args, Debug, Clone)]
pub struct RoutesArgs {
    /// Directory scanned recursively for handler files
    #[arg(long, default_value = "functions")]
    pub functions_dir: PathBuf,
}
