//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::app::QueryEdit;

/// Query controls shared by commands that show or export the table.
///
/// Values are passed through as typed; bad bounds are ignored and an unknown
/// sort key falls back to rank order.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Search university and country names
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only show this country
    #[arg(long)]
    pub country: Option<String>,

    /// Lowest rank to show
    #[arg(long, value_name = "RANK")]
    pub rank_min: Option<String>,

    /// Highest rank to show
    #[arg(long, value_name = "RANK")]
    pub rank_max: Option<String>,

    /// Sort order, e.g. rank-asc, score-desc, name-asc, country-asc
    #[arg(long, value_name = "KEY")]
    pub sort: Option<String>,
}

impl FilterArgs {
    /// The query edits these arguments describe.
    #[must_use]
    pub fn edits(&self) -> Vec<QueryEdit> {
        let mut edits = Vec::new();
        if let Some(text) = &self.search {
            edits.push(QueryEdit::Text(text.clone()));
        }
        if let Some(country) = &self.country {
            edits.push(QueryEdit::Country(country.clone()));
        }
        if let Some(min) = &self.rank_min {
            edits.push(QueryEdit::RankMin(min.clone()));
        }
        if let Some(max) = &self.rank_max {
            edits.push(QueryEdit::RankMax(max.clone()));
        }
        if let Some(sort) = &self.sort {
            edits.push(QueryEdit::Sort(sort.clone()));
        }
        edits
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Query filters
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Rate command arguments.
#[derive(Debug, Args)]
pub struct RateCommand {
    /// University name, exactly as listed
    pub university: String,

    /// Stars, 1 to 5 (values outside are clamped)
    #[arg(allow_negative_numbers = true)]
    pub stars: i64,
}

/// Note commands.
#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Add a note
    Add {
        /// University the note is about
        university: String,

        /// Note text
        text: String,

        /// Attach a 1-5 star rating
        #[arg(short, long)]
        rating: Option<i64>,

        /// Author name (defaults to ui.default_author, then "anon")
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Show the notes feed once
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Follow the shared notes feed until interrupted
    Watch,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Query filters
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Directory to write the CSV into (defaults to export.directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Confirm removal of all local ratings and notes
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
