//! Finsight Storage Layer
//!
//! Implements the `AuditStore` and `CorpusProvider` traits from
//! `finsight-domain`.
//!
//! # Architecture
//!
//! - SQLite for run records and trace logs ([`SqliteAuditStore`])
//! - An in-memory store with the same semantics ([`MemoryAuditStore`])
//! - File-backed corpora searched through an HNSW index ([`FileCorpusProvider`])
//!
//! # Examples
//!
//! ```no_run
//! use finsight_store::SqliteAuditStore;
//! use finsight_domain::traits::AuditStore;
//!
//! let store = SqliteAuditStore::new("finsight.db").unwrap();
//! let run = store.create_run("annual_report.pdf").unwrap();
//! store.append_log(run.id, "Planner", "Processing: Revenue").unwrap();
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod corpus;
pub mod embedding;
pub mod ingest;
pub mod memory;
pub mod vector_index;

use finsight_domain::{RunId, RunStatus};
use thiserror::Error;

pub use audit::SqliteAuditStore;
pub use corpus::{CorpusError, FileCorpusProvider, VectorCorpus};
pub use embedding::{EmbeddingModel, HashingEmbeddingModel};
pub use ingest::{PreparedDocument, TextChunker};
pub use memory::MemoryAuditStore;

/// Errors that can occur during audit storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Run not found
    #[error("Run not found: {0}")]
    RunNotFound(RunId),

    /// Run already reached a terminal status
    #[error("Run {0} is finalized")]
    RunFinalized(RunId),

    /// Results were already stored for the run
    #[error("Results already set for run {0}")]
    ResultsAlreadySet(RunId),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Store cannot be used
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reject changes to a missing or terminal run
pub(crate) fn ensure_mutable(run_id: RunId, status: Option<RunStatus>) -> Result<(), StoreError> {
    match status {
        None => Err(StoreError::RunNotFound(run_id)),
        Some(status) if status.is_terminal() => Err(StoreError::RunFinalized(run_id)),
        Some(_) => Ok(()),
    }
}
