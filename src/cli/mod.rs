//! CLI module for rowgate
//!
//! Provides command-line interface for:
//! - serve: Connect to the database and serve the HTTP API
//! - check: Verify connectivity and list tables

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
