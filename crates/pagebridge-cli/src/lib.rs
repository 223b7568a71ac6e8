//! pagebridge CLI library.
//!
//! Wires the core library into a running dev server: spawns and supervises
//! the functions emulator, installs discovered routes into a proxy table,
//! and serves static files plus proxied function requests over HTTP.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod proxy;
pub mod server;
pub mod supervisor;
pub mod ui;
