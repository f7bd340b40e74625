//! Language-model completion capability.
//!
//! [`ChatModel`] is the seam the turn orchestrator talks to.
//! [`OpenAiChatModel`] implements it against an OpenAI-compatible
//! `POST /chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::Role;

/// One entry of the prompt sequence sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response parsed but carried no usable completion.
    #[error("model returned no completion")]
    EmptyCompletion,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the first choice's text, untrimmed.
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, LlmError>;
}

// ── OpenAI-compatible client ──────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChatModel {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body<'a>(model: &'a str, messages: &'a [PromptMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage { role: m.role.as_ref(), content: &m.content })
                .collect(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(model, messages))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = resp.json().await?;
        first_completion(parsed)
    }
}

fn first_completion(resp: CompletionResponse) -> Result<String, LlmError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LlmError::EmptyCompletion)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
