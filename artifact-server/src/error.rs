//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are converted to a JSON-body
//! HTTP response with an appropriate status code.
//!
//! **Security note:** internal errors (upstream model, database, templates)
//! are logged with full detail but only a generic message is returned to the
//! caller, so API keys echoed in upstream bodies, SQL or file paths never
//! reach clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::llm::LlmError;

/// All errors that can occur in the artifact-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The language model could not produce an answer.
    #[error("upstream model error: {0}")]
    Upstream(#[from] LlmError),

    /// Propagated from the history store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A landing page template failed to load or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),

            ServerError::Upstream(e) => {
                error!(error = %e, "language model error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "the artifact could not answer right now".to_owned(),
                )
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Template(e) => {
                error!(error = %e, "template error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
