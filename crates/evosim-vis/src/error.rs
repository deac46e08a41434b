//! Error types for evosim-vis.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type for evosim-vis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the server and its driver task.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Orchestrator(#[from] evosim_orchestrator::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The driver task is gone; no control can be applied.
    #[error("orchestrator driver stopped")]
    DriverStopped,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown control: {0}")]
    UnknownControl(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        use evosim_orchestrator::Error as Orch;
        match self {
            Error::Orchestrator(Orch::InvalidPhase { .. } | Orch::Busy) => StatusCode::CONFLICT,
            Error::Orchestrator(Orch::Rpc(_)) => StatusCode::BAD_GATEWAY,
            Error::Orchestrator(Orch::Invariant(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Orchestrator(Orch::Config(_)) | Error::Config(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::DriverStopped => StatusCode::SERVICE_UNAVAILABLE,
            Error::UnknownControl(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
