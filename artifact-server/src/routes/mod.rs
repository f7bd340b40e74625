//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Usage hint and persona landing pages
//! - The `/chat` turn endpoint
//! - Health / heartbeat route
//! - Static assets under `/static`
//! - Optional OpenAPI document (disable with `ARTIFACT_ENABLE_DOCS=false`)

mod chat;
pub mod doc;
mod health;
mod pages;

use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(chat::router())
        .merge(pages::router());

    if state.config.enable_docs {
        app = app.merge(doc::router());
    }

    app.nest_service("/static", ServeDir::new(&state.config.static_dir))
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state.config)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace::trace_middleware,
        ))
        .with_state(state)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
