//! Error types for the Extractor

use finsight_domain::RecordError;
use thiserror::Error;

/// Errors that can occur while answering one task
///
/// Every variant is a per-task failure: the orchestrator records it in the
/// trace log and moves on to the next task.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// An LLM call exceeded its time budget
    #[error("{stage} timed out after {secs}s")]
    Timeout {
        /// Pipeline stage that timed out
        stage: &'static str,
        /// Budget in seconds
        secs: u64,
    },

    /// The LLM reply does not have the expected shape
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Neither corpus returned any snippet
    #[error("Retrieval empty: no context found for the question")]
    EmptyContext,

    /// A retriever failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The parsed record violates a record invariant
    #[error("Validation error: {0}")]
    Validation(#[from] RecordError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
