//! Command implementations for the pagebridge CLI.

pub mod dev;
pub mod routes;
