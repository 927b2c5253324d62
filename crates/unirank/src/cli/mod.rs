//! Command-line interface for unirank.
//!
//! This module provides the CLI structure for the `unirank` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, ExportCommand, FilterArgs, ListCommand, NoteCommand,
    OutputFormat, RateCommand,
};

/// unirank - Browse university rankings
///
/// Filter and sort a ranking data set, keep your own star ratings and notes,
/// and export what you see to CSV.
#[derive(Debug, Parser)]
#[command(name = "unirank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the ranking data file, overriding data.path
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the ranking table
    List(ListCommand),

    /// List the countries in the data set
    Countries,

    /// Vote for a university
    Rate(RateCommand),

    /// Add, list, or follow notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Write the table to university_rankings.csv
    Export(ExportCommand),

    /// Remove all local ratings and notes
    Clear(ClearCommand),

    /// Start an interactive session
    Browse,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
