//! Finsight Server
//!
//! HTTP service that starts extraction runs in the background and lets
//! clients poll their status, results and trace logs.
//!
//! # Endpoints
//!
//! | Method | Path                       | Response                                  |
//! |--------|----------------------------|-------------------------------------------|
//! | GET    | `/api/health`              | service status                            |
//! | POST   | `/api/v1/extract`          | 202 `{run_id, status}`, 404 no document   |
//! | GET    | `/api/v1/runs`             | recent runs, newest first                 |
//! | GET    | `/api/v1/runs/:id`         | run record                                |
//! | DELETE | `/api/v1/runs/:id`         | 204, 409 while in progress                |
//! | GET    | `/api/v1/runs/:id/results` | run + aggregate + logs, 409 while running |

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;

use config::{CurrencyConfig, LlmConfig, ServerConfig};
use finsight_agent::Agent;
use finsight_currency::{CurrencyConverter, HttpRateSource};
use finsight_llm::OllamaProvider;
use finsight_store::{FileCorpusProvider, SqliteAuditStore};
use handlers::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::{AppError, ServerError};

/// The agent wired to Ollama, the file corpora and the SQLite audit store
pub type LiveAgent = Agent<OllamaProvider, FileCorpusProvider, SqliteAuditStore>;

/// Install the stderr fmt subscriber (`RUST_LOG`, default `info`)
///
/// A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build the Ollama provider described by `config`
pub fn build_llm(config: &LlmConfig) -> Result<OllamaProvider, ServerError> {
    let provider = OllamaProvider::with_timeout(
        config.endpoint.clone(),
        config.contextualizer_model.clone(),
        Duration::from_secs(config.timeout_secs),
    )
    .map_err(|e| ServerError::Init(e.to_string()))?;

    Ok(provider
        .with_structured_model(config.extraction_model.clone())
        .with_max_retries(config.max_retries))
}

/// Build the process-wide currency converter
pub fn build_converter(config: &CurrencyConfig) -> Result<Arc<CurrencyConverter>, ServerError> {
    let source = HttpRateSource::new(
        config.endpoint.clone(),
        Duration::from_secs(config.timeout_secs),
    )
    .map_err(|e| ServerError::Init(e.to_string()))?;

    Ok(Arc::new(
        CurrencyConverter::new(Arc::new(source))
            .with_ttl(Duration::from_secs(config.cache_ttl_secs)),
    ))
}

/// Wire every collaborator named in `config` into an agent
pub fn build_agent(config: &ServerConfig) -> Result<LiveAgent, ServerError> {
    let catalog = config
        .agent
        .catalog()
        .map_err(|e| ServerError::Init(e.to_string()))?;
    let queue = config.agent.queue(&catalog);

    let store = SqliteAuditStore::new(&config.database_path)
        .map_err(|e| ServerError::Init(e.to_string()))?;
    let corpus = FileCorpusProvider::new(&config.documents_dir, &config.corpus_dir);

    Ok(Agent::new(
        Arc::new(build_llm(&config.llm)?),
        Arc::new(corpus),
        Arc::new(store),
        build_converter(&config.currency)?,
        config.extractor.clone(),
    )
    .with_catalog(catalog)
    .with_queue(queue))
}

/// Start the HTTP server
///
/// Builds the agent from `config`, binds the listener and serves until the
/// process exits.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting Finsight server");
    info!("Database: {}", config.database_path.display());
    info!("Documents: {}", config.documents_dir.display());
    info!("Corpora: {}", config.corpus_dir.display());
    info!(
        "LLM: {} (contextualizer {}, extraction {})",
        config.llm.endpoint, config.llm.contextualizer_model, config.llm.extraction_model
    );
    info!("Conversion mode: {:?}", config.extractor.conversion_mode);

    let agent = build_agent(&config)?;
    info!("Task queue: {} tasks", agent.queue().len());

    let app = create_router(AppState::new(agent));

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
