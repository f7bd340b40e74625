//! Usage hint and persona landing pages.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::error::ServerError;
use crate::state::AppState;

pub const USAGE_HINT: &str = "Open /a or /b to talk to an artifact.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/{artifact_id}", get(persona_page))
}

async fn root() -> &'static str {
    USAGE_HINT
}

/// Landing page for a known persona (`GET /a`, `GET /b`).
async fn persona_page(
    State(state): State<Arc<AppState>>,
    Path(artifact_id): Path<String>,
) -> Result<Html<String>, ServerError> {
    if state.personas.get(&artifact_id).is_none() {
        return Err(ServerError::NotFound(format!("no artifact named '{artifact_id}'")));
    }
    Ok(Html(state.pages.render_persona(&artifact_id)?))
}
