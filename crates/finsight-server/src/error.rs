//! Server and HTTP error types

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use finsight_agent::AgentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or running the service
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to bind the listener
    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),

    /// A collaborator could not be constructed
    #[error("Initialization error: {0}")]
    Init(String),

    /// Server runtime error
    #[error("Server error: {0}")]
    Server(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type returned by handlers
#[derive(Debug)]
pub enum AppError {
    /// No run with the requested id
    RunNotFound(i64),
    /// Results requested for a run still in progress
    RunInProgress(i64),
    /// Malformed request
    BadRequest(String),
    /// Run-level agent failure
    Agent(AgentError),
    /// Audit store or other internal failure
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::RunNotFound(id) => (StatusCode::NOT_FOUND, format!("Run {} not found", id)),
            AppError::RunInProgress(id) => (
                StatusCode::CONFLICT,
                format!("Run {} is still in progress", id),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Agent(e @ AgentError::DocumentNotFound(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            AppError::Agent(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}
