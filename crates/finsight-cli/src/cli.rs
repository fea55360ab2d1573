//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Finsight CLI - Extract key metrics from annual reports.
#[derive(Debug, Parser)]
#[command(name = "finsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FINSIGHT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs and values only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction queue against a document and wait for it
    Run(RunArgs),

    /// Build (or rebuild) the corpora of a document
    Index(IndexArgs),

    /// Show a run with its results and trace log
    Show(ShowArgs),

    /// List recent runs
    Runs(RunsArgs),

    /// Print the current INR to USD exchange rate
    Rate,

    /// Start the HTTP server
    Serve,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Document name (e.g., tcs_2024.pdf)
    pub filename: String,

    /// Task label to run; repeat to run several (default: configured queue)
    #[arg(short, long = "task")]
    pub tasks: Vec<String>,
}

/// Arguments for the index command.
#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Document name (e.g., tcs_2024.pdf)
    pub filename: String,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Run ID
    pub run_id: i64,

    /// Omit the trace log
    #[arg(long)]
    pub no_logs: bool,
}

/// Arguments for the runs command.
#[derive(Debug, Parser)]
pub struct RunsArgs {
    /// Maximum number of runs
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

impl From<CliFormat> for crate::output::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::output::OutputFormat::Table,
            CliFormat::Json => crate::output::OutputFormat::Json,
            CliFormat::Quiet => crate::output::OutputFormat::Quiet,
        }
    }
}
