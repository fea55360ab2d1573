//! Finsight Agent
//!
//! Runs the extraction task queue against one document and keeps the audit
//! trail of every step.
//!
//! # Architecture
//!
//! ```text
//! start ──► prepare (open | index | DocumentNotFound) ──► task loop ──► Completed
//!                                                            │
//!            per task: Planner → Contextualizer → Retriever → Extractor → merge
//! ```
//!
//! A failing task is logged and skipped; only audit store and corpus faults
//! fail the run.
//!
//! # Example Usage
//!
//! ```no_run
//! use finsight_agent::Agent;
//! use finsight_currency::{CurrencyConverter, HttpRateSource};
//! use finsight_extractor::ExtractorConfig;
//! use finsight_llm::OllamaProvider;
//! use finsight_store::{FileCorpusProvider, SqliteAuditStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let agent = Agent::new(
//!     Arc::new(OllamaProvider::default_endpoint("llama3.1")?),
//!     Arc::new(FileCorpusProvider::new("data/documents", "data/corpus")),
//!     Arc::new(SqliteAuditStore::new("finsight.db")?),
//!     Arc::new(CurrencyConverter::new(Arc::new(HttpRateSource::default_endpoint()?))),
//!     ExtractorConfig::default(),
//! );
//!
//! let outcome = agent.run("tcs_2024.pdf").await?;
//! println!("run {} {}: {} found", outcome.run_id, outcome.status, outcome.stats.found);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
mod config;
mod error;
mod orchestrator;
mod run;

#[cfg(test)]
mod tests;

pub use catalog::TaskCatalog;
pub use config::AgentConfig;
pub use error::AgentError;
pub use orchestrator::{Agent, CONTEXTUALIZER, EXTRACTOR, ORCHESTRATOR, PLANNER, RETRIEVER};
pub use run::{summarize, RunContext, RunOutcome, RunStats, TaskOutcome};
