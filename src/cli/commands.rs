//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - schedule: run one scheduling cycle and report candidates versus admitted
//! - generate: write a random dataset to a file
//! - validate-config: check and print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mailing Scheduler - selects the messages admitted in one send cycle
#[derive(Parser, Debug)]
#[command(name = "mailing-scheduler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one scheduling cycle
    Schedule {
        /// Dataset file to schedule; a random dataset is generated when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write admitted messages to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,

        /// Write the statistics report as JSON to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Seed for the generated dataset
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a random dataset
    Generate {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate configuration and print effective values
    ValidateConfig,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Schedule {
            input: None,
            output: None,
            json: false,
            report: None,
            seed: None,
        }
    }
}
