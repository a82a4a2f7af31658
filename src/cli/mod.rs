//! CLI module for deepdive
//!
//! Provides command-line interface parsing for the deepdive binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// deepdive - Iterative Deep Research Server
///
/// Plans web searches for a topic, summarizes the results, and keeps
/// refining until the evidence is sufficient, then writes a report.
#[derive(Parser, Debug)]
#[command(
    name = "deepdive",
    version,
    about = "deepdive - Iterative Deep Research Server",
    long_about = "Plans web searches for a topic, summarizes what they return and asks an\n\
                  analysis model whether more rounds are needed, then writes a markdown report.\n\n\
                  Run without arguments to start the server, or use 'run' for a one-off research.",
    after_help = "EXAMPLES:\n    \
                  deepdive                          # Start the server (deepdive.toml optional)\n    \
                  deepdive run \"solid-state batteries\" # Research a topic from the terminal\n    \
                  deepdive config --validate        # Check the configuration file\n    \
                  deepdive --config my.toml         # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "deepdive.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Research a topic and print the report
    Run {
        /// The research topic
        topic: String,

        /// Override research.max_iterations
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
