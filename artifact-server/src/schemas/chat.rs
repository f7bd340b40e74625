use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::turn::TurnReply;

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Caller-chosen visitor id; scopes the conversation history.
    pub user_id: String,
    /// Persona to talk to (`"a"` or `"b"`); unknown ids fall back to defaults.
    pub artifact_id: String,
    /// The visitor's message.
    pub message: String,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// The persona's answer.
    pub response: String,
    /// Public MP3 URL, or `null` when speech could not be produced.
    pub audio_url: Option<String>,
}

impl From<TurnReply> for ChatResponse {
    fn from(reply: TurnReply) -> Self {
        Self {
            response: reply.response,
            audio_url: reply.audio.into_url(),
        }
    }
}
