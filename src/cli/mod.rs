//! Command-line parsing for the CSV-to-warehouse uploader.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the load/filter/materialize code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "csvlift", version, about = "CSV time-series uploader for a cloud warehouse")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a CSV, optionally date-filter it, and print the preview + charts.
    Preview(PreviewArgs),
    /// Load, filter, connect, and materialize the filtered rows.
    Push(PushArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `csvlift push`, but renders
    /// the preview, date selector, and charts in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Common input options: which CSV, which date interval.
#[derive(Debug, Parser, Clone)]
pub struct InputArgs {
    /// CSV file to load (interactive picker if omitted).
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Interval start (YYYY-MM-DD, inclusive). Defaults to the earliest date.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Interval end (YYYY-MM-DD, inclusive). Defaults to the latest date.
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Options for `csvlift preview`.
#[derive(Debug, Parser)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_charts: bool,
}

/// Options for `csvlift push`.
#[derive(Debug, Parser)]
pub struct PushArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// JSON credential file (account/user/password/database/schema).
    ///
    /// When none of the manual credential flags are set, this defaults to
    /// `creds-snowflake.json` in the working directory.
    #[arg(long)]
    pub creds: Option<PathBuf>,

    /// Warehouse account identifier (manual credential entry).
    #[arg(long)]
    pub account: Option<String>,

    /// Warehouse user (manual credential entry).
    #[arg(long)]
    pub user: Option<String>,

    /// Warehouse password (manual credential entry).
    #[arg(long)]
    pub password: Option<String>,

    /// Target database (manual credential entry).
    #[arg(long)]
    pub database: Option<String>,

    /// Target schema (manual credential entry).
    #[arg(long)]
    pub schema: Option<String>,

    /// Target table name (defaults to the CSV file stem, spaces -> underscores).
    #[arg(long)]
    pub table: Option<String>,
}

impl PushArgs {
    /// Any manual credential flag present means manual entry mode.
    pub fn manual_mode(&self) -> bool {
        self.account.is_some()
            || self.user.is_some()
            || self.password.is_some()
            || self.database.is_some()
            || self.schema.is_some()
    }
}

/// Options for `csvlift tui`.
#[derive(Debug, Parser)]
pub struct TuiArgs {
    /// CSV file to preselect in the file list.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// JSON credential file to prefill the credentials form.
    #[arg(long)]
    pub creds: Option<PathBuf>,
}
