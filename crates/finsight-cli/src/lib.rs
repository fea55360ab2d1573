//! Finsight CLI library.
//!
//! Command parsing, configuration lookup, command execution and output
//! formatting for the `finsight` binary. Runs, indexing and the server are
//! wired through `finsight-server`, so the CLI and the HTTP service read the
//! same configuration file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
