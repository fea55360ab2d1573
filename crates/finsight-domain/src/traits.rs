//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::aggregate::ResultAggregate;
use crate::corpus::{Corpora, Snippet};
use crate::run::{RunId, RunRecord, RunStatus, RunWithLogs, TraceLogEntry};
use async_trait::async_trait;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (finsight-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a free-text completion
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to a JSON schema
    ///
    /// `schema` is JSON schema text. The reply is JSON text (possibly fenced)
    /// or a bare "NOT FOUND".
    async fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// Similarity search over one corpus
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Error type for retrieval
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return up to `k` snippets, most similar first
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Snippet>, Self::Error>;
}

/// Opens and builds the corpora of a document
///
/// Implemented by the infrastructure layer (finsight-store)
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Retriever handed out per corpus
    type Retriever: Retriever;

    /// Error type for corpus operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the indexed corpora of `document`
    ///
    /// Returns `Ok(None)` when the document has not been indexed yet.
    async fn open(&self, document: &str) -> Result<Option<Corpora<Self::Retriever>>, Self::Error>;

    /// Build the corpora of `document` from its prepared source and open them
    ///
    /// Returns `Ok(None)` when the document itself does not exist.
    async fn index(&self, document: &str) -> Result<Option<Corpora<Self::Retriever>>, Self::Error>;
}

/// Trait for persisting runs and their trace logs
///
/// Implementations serialize writes internally so one store can be shared by
/// concurrent runs. Once a run is terminal its status, task and results are
/// frozen; only log appends are accepted.
///
/// Implemented by the infrastructure layer (finsight-store)
pub trait AuditStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create an in-progress run and assign its id
    fn create_run(&self, filename: &str) -> Result<RunRecord, Self::Error>;

    /// Append a trace entry to a run
    fn append_log(
        &self,
        run_id: RunId,
        node_name: &str,
        message: &str,
    ) -> Result<TraceLogEntry, Self::Error>;

    /// Update the current-task text of a non-terminal run
    fn set_task(&self, run_id: RunId, current_task: &str) -> Result<(), Self::Error>;

    /// Change the status of a non-terminal run
    ///
    /// Moving to a terminal status records the end time.
    fn set_status(&self, run_id: RunId, status: RunStatus) -> Result<(), Self::Error>;

    /// Store the final aggregate of a non-terminal run (once)
    fn set_results(&self, run_id: RunId, results: &ResultAggregate) -> Result<(), Self::Error>;

    /// Get a run by id
    fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>, Self::Error>;

    /// Get a run with all of its trace entries in insertion order
    fn get_run_with_logs(&self, run_id: RunId) -> Result<Option<RunWithLogs>, Self::Error>;

    /// Most recent runs first
    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, Self::Error>;

    /// Delete a run and its trace entries; returns whether it existed
    fn delete_run(&self, run_id: RunId) -> Result<bool, Self::Error>;
}
