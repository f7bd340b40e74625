//! In-process stand-ins for the upstream services, shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use crate::persona::Voice;
use crate::services::llm::{ChatModel, LlmError, PromptMessage};
use crate::services::storage::{ObjectStorage, StorageError};
use crate::services::tts::{AudioStream, SpeechError, SpeechSynthesizer};

/// Echoes a canned reply and records every call.
pub struct FakeChatModel {
    reply: String,
    calls: Mutex<Vec<(String, Vec<PromptMessage>)>>,
}

impl FakeChatModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(String, Vec<PromptMessage>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Vec<PromptMessage> {
        self.calls().pop().map(|(_, p)| p).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push((model.to_owned(), messages.to_vec()));
        let turn = self.calls.lock().unwrap().len();
        Ok(self.reply.replace("{n}", &turn.to_string()))
    }
}

pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _model: &str, _messages: &[PromptMessage]) -> Result<String, LlmError> {
        Err(LlmError::Status { status: 503, body: "overloaded".into() })
    }
}

/// Streams fixed chunks and records the requested voice ids.
pub struct FakeSynthesizer {
    chunks: Vec<Vec<u8>>,
    voices: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks, voices: Mutex::new(Vec::new()) }
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str, voice: &Voice) -> Result<AudioStream, SpeechError> {
        self.voices.lock().unwrap().push(voice.voice_id.clone());
        let chunks: Vec<Result<Bytes, SpeechError>> =
            self.chunks.iter().cloned().map(|c| Ok(Bytes::from(c))).collect();
        Ok(stream::iter(chunks).boxed())
    }
}

pub struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &Voice) -> Result<AudioStream, SpeechError> {
        Err(SpeechError::Status { status: 401, body: "invalid api key".into() })
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub bucket: String,
    pub object_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub upsert: bool,
}

/// Keeps uploads in memory and builds Supabase-style public URLs.
pub struct MemoryStorage {
    url: String,
    uploads: Mutex<Vec<Upload>>,
}

impl MemoryStorage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), uploads: Mutex::new(Vec::new()) }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError> {
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_owned(),
            object_name: object_name.to_owned(),
            bytes,
            content_type: content_type.to_owned(),
            upsert,
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, bucket, object_name)
    }
}

pub struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn upload(
        &self,
        _bucket: &str,
        _object_name: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
        _upsert: bool,
    ) -> Result<(), StorageError> {
        Err(StorageError::Status { status: 413, body: "payload too large".into() })
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!("unreachable/{bucket}/{object_name}")
    }
}
