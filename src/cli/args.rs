//! CLI argument definitions using clap
//!
//! Commands:
//! - rowgate serve [--config <path>]
//! - rowgate check [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rowgate - REST access to PostgreSQL tables
#[derive(Parser, Debug)]
#[command(name = "rowgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the database and serve the HTTP API
    Serve {
        /// Path to a JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Verify connectivity and print the visible tables
    Check {
        /// Path to a JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
