// CLI module for command-line interface

use crate::log::LogLevel;
use crate::models::{FileStatus, FileType, HitType};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
pub mod commands;
pub mod output;

/// Main CLI structure
#[derive(Parser, Clone, Debug)]
#[command(name = "sirc", version)]
#[command(
    about = "Death-registry crossing dashboard: files, crossings and query results",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Page selection shared by the list commands
#[derive(Args, Clone, Debug)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Items per page (defaults to the configured page size)
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Available CLI commands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Validate or format CPF numbers
    Cpf {
        #[command(subcommand)]
        action: CpfAction,
    },

    /// Uploaded death-record files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Crossings of files against the registry
    Crossings {
        #[command(subcommand)]
        action: CrossingsAction,
    },

    /// Query results produced by crossings
    Results {
        #[command(subcommand)]
        action: ResultsAction,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(ignore_case = true)]
        shell: Shell,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum CpfAction {
    /// Check the verification digits
    Validate { cpf: String },

    /// Print as 000.000.000-00
    Format {
        cpf: String,

        /// Format a partially typed value progressively
        #[arg(short, long, default_value_t = false)]
        partial: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum FilesAction {
    /// List files, newest upload first
    List {
        /// Substring of the file name
        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", ignore_case = true)]
        file_type: Option<FileType>,

        /// Repeatable
        #[arg(long, ignore_case = true)]
        status: Vec<FileStatus>,

        /// First reference, MM/YYYY
        #[arg(long)]
        from: Option<String>,

        /// Last reference, MM/YYYY
        #[arg(long)]
        to: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Counts by status and type
    Stats,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CrossingsAction {
    /// List crossings, newest first
    List {
        #[arg(long)]
        file: Option<String>,

        /// First reference, MM/YYYY
        #[arg(long)]
        from: Option<String>,

        /// Last reference, MM/YYYY
        #[arg(long)]
        to: Option<String>,

        /// Minimum hit percentage
        #[arg(long)]
        min: Option<f64>,

        /// Maximum hit percentage
        #[arg(long)]
        max: Option<f64>,

        /// Crossing date, YYYY-MM-DD
        #[arg(long)]
        since: Option<String>,

        /// Crossing date, YYYY-MM-DD
        #[arg(long)]
        until: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Totals over every crossing
    Summary,
}

/// Criteria shared by result search, statistics and export
#[derive(Args, Clone, Debug, Default)]
pub struct ResultCriteria {
    /// Full or partial CPF, punctuation ignored
    #[arg(long)]
    pub cpf: Option<String>,

    /// Substring of the name or the mother's name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub crossing: Option<String>,

    /// First reference, MM/YYYY
    #[arg(long)]
    pub from: Option<String>,

    /// Last reference, MM/YYYY
    #[arg(long)]
    pub to: Option<String>,

    /// Repeatable
    #[arg(long = "hit", ignore_case = true)]
    pub hit_types: Vec<HitType>,

    /// Keep results without any hit
    #[arg(long, default_value_t = false)]
    pub include_no_hits: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ResultsAction {
    /// Search results
    Search {
        #[command(flatten)]
        criteria: ResultCriteria,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Statistics over the matching results
    Stats {
        #[command(flatten)]
        criteria: ResultCriteria,
    },

    /// Compare a result with the personal-registration system
    Compare { id: String },

    /// Write the matching results as CSV
    Export {
        /// Target file or directory; a directory gets the dated default name
        path: Option<PathBuf>,

        #[command(flatten)]
        criteria: ResultCriteria,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Print the configuration file
    Show,

    /// Set the retry policy used when loading data
    SetRetry {
        #[arg(long)]
        max_retries: Option<u32>,

        /// Base delay in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Backoff cap in milliseconds
        #[arg(long)]
        max_delay_ms: Option<u64>,

        #[arg(long)]
        backoff: Option<bool>,
    },

    /// Load data from a JSON snapshot instead of the embedded seed
    SetData {
        /// Omit to go back to the embedded seed
        path: Option<PathBuf>,
    },

    /// Set the minimum log level
    LogLevel { level: LogLevel },

    /// Set the default page size
    PageSize { size: usize },
}
