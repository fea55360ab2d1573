//! HTTP request handlers for the extraction service.
//!
//! `POST /api/v1/extract` prepares the run synchronously so a missing
//! document is reported as 404, then executes the task loop on its own tokio
//! task; the remaining endpoints poll the audit store.

use crate::error::AppError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router as AxumRouter,
};
use finsight_agent::Agent;
use finsight_domain::traits::{AuditStore, CorpusProvider, LlmProvider};
use finsight_domain::{ResultAggregate, RunId, RunRecord, RunStatus, TraceLogEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Default number of runs returned by `GET /api/v1/runs`
pub const DEFAULT_RUN_LIMIT: usize = 20;

/// Upper bound on the `limit` query parameter
pub const MAX_RUN_LIMIT: usize = 200;

/// Shared application state
pub struct AppState<L, P, A>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    /// Agent shared by every spawned run
    pub agent: Arc<Agent<L, P, A>>,
}

impl<L, P, A> AppState<L, P, A>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    /// Wrap an agent
    pub fn new(agent: Agent<L, P, A>) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}

impl<L, P, A> Clone for AppState<L, P, A>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    fn clone(&self) -> Self {
        Self {
            agent: Arc::clone(&self.agent),
        }
    }
}

/// Extraction request
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractRequest {
    /// Document name, e.g. "tcs_2024.pdf"
    pub filename: String,
}

/// Accepted extraction
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    /// Id to poll
    pub run_id: RunId,
    /// Always `in_progress` at acceptance
    pub status: RunStatus,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Service version
    pub version: String,
    /// Number of tasks in the catalog
    pub tasks: usize,
}

/// Query parameters of `GET /api/v1/runs`
#[derive(Debug, Deserialize)]
pub struct ListRunsParams {
    /// Maximum number of runs
    pub limit: Option<usize>,
}

/// Results of a terminal run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResultsResponse {
    /// The run record
    pub run: RunRecord,
    /// Collected metrics; empty when the run failed before storing any
    pub results: ResultAggregate,
    /// Trace entries in insertion order
    pub logs: Vec<TraceLogEntry>,
}

fn internal<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Internal(e.to_string())
}

/// GET /api/health
async fn health_check<L, P, A>(State(state): State<AppState<L, P, A>>) -> Json<HealthCheckResponse>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tasks: state.agent.catalog().len(),
    })
}

/// POST /api/v1/extract - Start a run
async fn start_extraction<L, P, A>(
    State(state): State<AppState<L, P, A>>,
    Json(request): Json<ExtractRequest>,
) -> Result<impl IntoResponse, AppError>
where
    L: LlmProvider + 'static,
    P: CorpusProvider + 'static,
    P::Retriever: 'static,
    A: AuditStore + 'static,
{
    let filename = request.filename.trim().to_string();
    if filename.is_empty() {
        return Err(AppError::BadRequest("filename must not be empty".to_string()));
    }

    let run = state.agent.start(&filename)?;
    let corpora = state.agent.prepare(&run).await?;

    let agent = Arc::clone(&state.agent);
    let spawned = run.clone();
    tokio::spawn(async move {
        if let Err(e) = agent.execute(&spawned, corpora).await {
            error!(run_id = %spawned.id, error = %e, "Background run failed");
        }
    });

    info!(run_id = %run.id, filename = %run.filename, "Extraction accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(ExtractResponse {
            run_id: run.id,
            status: RunStatus::InProgress,
        }),
    ))
}

/// GET /api/v1/runs - Most recent runs first
async fn list_runs<L, P, A>(
    State(state): State<AppState<L, P, A>>,
    Query(params): Query<ListRunsParams>,
) -> Result<Json<Vec<RunRecord>>, AppError>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RUN_LIMIT)
        .clamp(1, MAX_RUN_LIMIT);
    let runs = state.agent.store().list_runs(limit).map_err(internal)?;
    Ok(Json(runs))
}

/// GET /api/v1/runs/:id - Status poll
async fn get_run<L, P, A>(
    State(state): State<AppState<L, P, A>>,
    Path(id): Path<i64>,
) -> Result<Json<RunRecord>, AppError>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    state
        .agent
        .store()
        .get_run(RunId(id))
        .map_err(internal)?
        .map(Json)
        .ok_or(AppError::RunNotFound(id))
}

/// GET /api/v1/runs/:id/results - Run, aggregate and trace of a terminal run
async fn get_run_results<L, P, A>(
    State(state): State<AppState<L, P, A>>,
    Path(id): Path<i64>,
) -> Result<Json<RunResultsResponse>, AppError>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    let with_logs = state
        .agent
        .store()
        .get_run_with_logs(RunId(id))
        .map_err(internal)?
        .ok_or(AppError::RunNotFound(id))?;

    if !with_logs.run.is_terminal() {
        return Err(AppError::RunInProgress(id));
    }

    let results = with_logs.run.results.clone().unwrap_or_default();
    Ok(Json(RunResultsResponse {
        run: with_logs.run,
        results,
        logs: with_logs.logs,
    }))
}

/// DELETE /api/v1/runs/:id - Remove a terminal run and its trace
async fn delete_run<L, P, A>(
    State(state): State<AppState<L, P, A>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    let store = state.agent.store();
    let run = store
        .get_run(RunId(id))
        .map_err(internal)?
        .ok_or(AppError::RunNotFound(id))?;

    if !run.is_terminal() {
        return Err(AppError::RunInProgress(id));
    }

    if store.delete_run(run.id).map_err(internal)? {
        info!(run_id = %run.id, "Run deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::RunNotFound(id))
    }
}

/// Create the axum router with all routes
pub fn create_router<L, P, A>(state: AppState<L, P, A>) -> AxumRouter
where
    L: LlmProvider + 'static,
    P: CorpusProvider + 'static,
    P::Retriever: 'static,
    A: AuditStore + 'static,
{
    AxumRouter::new()
        .route("/api/health", get(health_check::<L, P, A>))
        .route("/api/v1/extract", post(start_extraction::<L, P, A>))
        .route("/api/v1/runs", get(list_runs::<L, P, A>))
        .route(
            "/api/v1/runs/:id",
            get(get_run::<L, P, A>).delete(delete_run::<L, P, A>),
        )
        .route("/api/v1/runs/:id/results", get(get_run_results::<L, P, A>))
        .with_state(state)
}
