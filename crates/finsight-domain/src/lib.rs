//! Finsight Domain Layer
//!
//! This crate contains the core data model for Finsight's extraction pipeline
//! and the trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Task**: One targeted extraction goal bound to an output schema ([`TaskKind`])
//! - **Extracted record**: A tagged union with one case per task kind, either
//!   `FOUND` with its values or `NOT_FOUND` with none
//! - **Result aggregate**: The report document assembled across a run
//! - **Run / trace log**: The auditable record of one end-to-end execution
//!
//! ## Architecture
//!
//! - No network, database or LLM code lives here
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions ([`traits`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod corpus;
pub mod record;
pub mod run;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use aggregate::{KeyRisk, ResultAggregate, SegmentContribution};
pub use corpus::{Corpora, Snippet};
pub use record::{
    ExtractedRecord, ExtractionStatus, MonetaryRecord, RecordError, RiskItem, RiskRecord,
    SegmentItem, SegmentRecord, UtilizationRecord,
};
pub use run::{
    now_millis, InvalidTransition, RunId, RunPhase, RunRecord, RunStatus, RunWithLogs,
    TraceLogEntry, FINISHED_TASK, INITIAL_TASK,
};
pub use task::{TaskDefinition, TaskKind};
pub use traits::{AuditStore, CorpusProvider, LlmProvider, Retriever};
