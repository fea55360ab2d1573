//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server or collaborator setup error
    #[error(transparent)]
    Server(#[from] finsight_server::ServerError),

    /// Run-level failure
    #[error(transparent)]
    Agent(#[from] finsight_agent::AgentError),

    /// Audit store error
    #[error(transparent)]
    Store(#[from] finsight_store::StoreError),

    /// Corpus build error
    #[error(transparent)]
    Corpus(#[from] finsight_store::CorpusError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No run with this id
    #[error("Run {0} not found")]
    RunNotFound(i64),

    /// No prepared document with this name
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}
