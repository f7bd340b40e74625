//! Chat route.
//!
//! `POST /chat` runs one conversation turn against the requested persona and
//! returns the answer plus a playable audio URL. The URL is `null` whenever
//! speech synthesis or the upload failed; the text answer is returned either
//! way.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(post_chat), components(schemas(ChatRequest, ChatResponse)))]
pub struct ChatApi;

/// Register chat routes.
///
/// Messages are forwarded to the model at any length, so the request body
/// limit is lifted for `/chat`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(post_chat).layer(DefaultBodyLimit::disable()))
}

/// Talk to an artifact (`POST /chat`).
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer generated", body = ChatResponse),
        (status = 500, description = "Language model or database error"),
    )
)]
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    debug!(
        user_id = %req.user_id,
        artifact_id = %req.artifact_id,
        message_len = req.message.len(),
        "chat request"
    );
    let reply = state
        .turns
        .handle_turn(&req.user_id, &req.artifact_id, &req.message)
        .await?;
    Ok(Json(reply.into()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
