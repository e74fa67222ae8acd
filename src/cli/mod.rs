//! CLI module for mailing-scheduler - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running a scheduling
//! cycle, generating test datasets and checking configuration.

pub mod commands;

pub use commands::Cli;
