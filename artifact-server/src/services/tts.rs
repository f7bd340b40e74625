//! Text-to-speech capability backed by the ElevenLabs REST API.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::persona::{Voice, VoiceSettings};

/// Multilingual model, required for the Korean-speaking personas.
pub const TTS_MODEL: &str = "eleven_multilingual_v2";

/// MP3, 22.05 kHz, 32 kbit/s.
pub const OUTPUT_FORMAT: &str = "mp3_22050_32";

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Audio bytes as they arrive from the synthesizer.
pub type AudioStream = BoxStream<'static, Result<Bytes, SpeechError>>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("synthesizer returned no audio")]
    EmptyAudio,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<AudioStream, SpeechError>;
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url, voice_id, OUTPUT_FORMAT
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<AudioStream, SpeechError> {
        let resp = self
            .client
            .post(self.endpoint(&voice.voice_id))
            .header(XI_API_KEY_HEADER, &self.api_key)
            .json(&SynthesisRequest {
                text,
                model_id: TTS_MODEL,
                voice_settings: &voice.settings,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Status { status: status.as_u16(), body });
        }

        Ok(resp.bytes_stream().map_err(SpeechError::from).boxed())
    }
}

/// Drain `stream` into one buffer, skipping empty chunks.
pub async fn collect_audio(mut stream: AudioStream) -> Result<Vec<u8>, SpeechError> {
    let mut audio = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if !chunk.is_empty() {
            audio.extend_from_slice(&chunk);
        }
    }
    if audio.is_empty() {
        return Err(SpeechError::EmptyAudio);
    }
    Ok(audio)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn collect_audio_concatenates_chunks() {
        let chunks = vec![
            Ok(Bytes::from_static(b"ID3")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"frames")),
        ];
        let audio = collect_audio(stream::iter(chunks).boxed()).await.unwrap();
        assert_eq!(audio, b"ID3frames");
    }

    #[tokio::test]
    async fn collect_audio_rejects_empty_clip() {
        let empty: Vec<Result<Bytes, SpeechError>> = vec![Ok(Bytes::new())];
        let err = collect_audio(stream::iter(empty).boxed()).await.unwrap_err();
        assert!(matches!(err, SpeechError::EmptyAudio));
    }

    #[tokio::test]
    async fn collect_audio_propagates_stream_errors() {
        let chunks = vec![
            Ok(Bytes::from_static(b"ID3")),
            Err(SpeechError::Status { status: 500, body: "cut".into() }),
        ];
        assert!(collect_audio(stream::iter(chunks).boxed()).await.is_err());
    }

    #[test]
    fn endpoint_selects_voice_and_format() {
        let tts = ElevenLabsSynthesizer::new(Client::new(), "https://api.elevenlabs.io", "key");
        assert_eq!(
            tts.endpoint("AW5wrnG1jVizOYY7R1Oo"),
            "https://api.elevenlabs.io/v1/text-to-speech/AW5wrnG1jVizOYY7R1Oo?output_format=mp3_22050_32"
        );
    }

    #[test]
    fn request_body_carries_voice_settings() {
        let settings = VoiceSettings {
            stability: 0.5,
            similarity_boost: 0.7,
            style: 0.2,
            use_speaker_boost: false,
        };
        let body = serde_json::to_value(SynthesisRequest {
            text: "hello",
            model_id: TTS_MODEL,
            voice_settings: &settings,
        })
        .unwrap();
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["use_speaker_boost"], false);
    }
}
