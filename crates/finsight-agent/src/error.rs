//! Error types for the run orchestrator

use finsight_domain::InvalidTransition;
use thiserror::Error;

/// Run-level failures
///
/// Per-task failures never surface here; they are recorded in the trace log
/// and the run continues.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The requested document does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The audit store rejected or failed an operation
    #[error("Audit store error: {0}")]
    Store(String),

    /// The corpus provider failed
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Invalid catalog or queue configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run state machine was driven backwards
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}
