//! Object storage capability backed by Supabase Storage.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("storage is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError>;

    /// Publicly readable URL of an object. Pure string construction.
    fn public_url(&self, bucket: &str, object_name: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    url: String,
    key: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            key: key.into(),
        }
    }

    fn object_endpoint(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, bucket, object_name)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError> {
        if self.url.is_empty() {
            return Err(StorageError::NotConfigured);
        }

        let resp = self
            .client
            .post(self.object_endpoint(bucket, object_name))
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, bucket, object_name)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
