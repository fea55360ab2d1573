//! Finsight Extractor
//!
//! Answers one extraction task from a document's corpora.
//!
//! # Architecture
//!
//! ```text
//! Task label → Contextualizer → question → RetrievalGateway → context
//!            → StructuredExtractor → LLM (schema) → parser → normalize → ExtractedRecord
//! ```
//!
//! Every failure here is scoped to the current task; the orchestrator in
//! `finsight-agent` logs it and continues with the next one.
//!
//! # Example Usage
//!
//! ```no_run
//! use finsight_currency::{CurrencyConverter, HttpRateSource};
//! use finsight_domain::{TaskDefinition, TaskKind};
//! use finsight_extractor::{Contextualizer, ExtractorConfig, RetrievalGateway, StructuredExtractor};
//! use finsight_llm::OllamaProvider;
//! use finsight_store::FileCorpusProvider;
//! use finsight_domain::traits::CorpusProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = ExtractorConfig::default();
//! let llm = Arc::new(OllamaProvider::default_endpoint("llama3.1")?);
//! let converter = Arc::new(CurrencyConverter::new(Arc::new(HttpRateSource::default_endpoint()?)));
//!
//! let corpora = FileCorpusProvider::new("data/documents", "data/corpus")
//!     .open("tcs_2024.pdf")
//!     .await?
//!     .ok_or("not indexed")?;
//!
//! let task = TaskDefinition::new("Consolidated Revenue (USD Billion)", TaskKind::Revenue, "")
//!     .with_target_unit("USD Billion");
//!
//! let question = Contextualizer::new(llm.clone(), config.contextualize_timeout())
//!     .contextualize(&task.label)
//!     .await?;
//! let context = RetrievalGateway::new(config.top_k).gather(&question, &corpora).await?;
//! let record = StructuredExtractor::new(llm, converter, config)
//!     .extract(&task, &question, &context)
//!     .await?;
//!
//! println!("{}: {}", record.kind(), record.status());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod contextualizer;
mod error;
mod extractor;
mod gateway;
mod parser;
mod prompt;
mod schema;


pub use config::{ConversionMode, ExtractorConfig};
pub use contextualizer::Contextualizer;
pub use error::ExtractorError;
pub use extractor::StructuredExtractor;
pub use gateway::{CombinedContext, RetrievalGateway};
pub use parser::parse_record;
pub use prompt::{contextualizer_prompt, PromptBuilder};
pub use schema::{schema_for, schema_text};
