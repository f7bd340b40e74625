//! Speech synthesis and publishing.
//!
//! Turns an answer into an MP3 clip, uploads it and hands back its public
//! URL. This step is best effort: every failure is folded into
//! [`AudioOutcome::Failed`] and logged, and the text reply is returned
//! regardless.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::persona::PersonaRegistry;
use crate::services::storage::{ObjectStorage, StorageError};
use crate::services::tts::{collect_audio, SpeechError, SpeechSynthesizer};

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Result of the speech step for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOutcome {
    Published { url: String },
    Failed { reason: String },
}

impl AudioOutcome {
    /// Collapse to the nullable URL exposed by the HTTP API.
    pub fn into_url(self) -> Option<String> {
        match self {
            AudioOutcome::Published { url } => Some(url),
            AudioOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum PublishError {
    #[error("synthesis failed: {0}")]
    Speech(#[from] SpeechError),
    #[error("upload failed: {0}")]
    Storage(#[from] StorageError),
}

pub struct SpeechPublisher {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    storage: Arc<dyn ObjectStorage>,
    personas: Arc<PersonaRegistry>,
    bucket: String,
}

impl std::fmt::Debug for SpeechPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechPublisher")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl SpeechPublisher {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        storage: Arc<dyn ObjectStorage>,
        personas: Arc<PersonaRegistry>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            storage,
            personas,
            bucket: bucket.into(),
        }
    }

    /// Synthesize `text` in the voice of `artifact_id` and publish it.
    ///
    /// Never fails; see [`AudioOutcome`].
    pub async fn publish(&self, text: &str, artifact_id: &str, user_id: &str) -> AudioOutcome {
        match self.try_publish(text, artifact_id, user_id, Utc::now()).await {
            Ok(url) => {
                info!(%url, artifact_id, "audio published");
                AudioOutcome::Published { url }
            }
            Err(e) => {
                warn!(error = %e, artifact_id, user_id, "audio step failed; replying without audio");
                AudioOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    async fn try_publish(
        &self,
        text: &str,
        artifact_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, PublishError> {
        let voice = self.personas.voice_for(artifact_id);
        let stream = self.synthesizer.synthesize(text, voice).await?;
        let audio = collect_audio(stream).await?;

        let name = object_name(artifact_id, user_id, now);
        self.storage
            .upload(&self.bucket, &name, audio, AUDIO_CONTENT_TYPE, true)
            .await?;
        Ok(self.storage.public_url(&self.bucket, &name))
    }
}

/// `{artifact}/{user}_{YYYYMMDDHHMMSS}.mp3`, unique per user and second.
pub fn object_name(artifact_id: &str, user_id: &str, now: DateTime<Utc>) -> String {
    format!("{}/{}_{}.mp3", artifact_id, user_id, now.format("%Y%m%d%H%M%S"))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
