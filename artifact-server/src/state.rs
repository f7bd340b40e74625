//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::entities::AnyStore;
use crate::pages::PageRenderer;
use crate::persona::PersonaRegistry;
use crate::services::llm::{ChatModel, OpenAiChatModel};
use crate::services::speech::SpeechPublisher;
use crate::services::storage::{ObjectStorage, SupabaseStorage};
use crate::services::tts::{ElevenLabsSynthesizer, SpeechSynthesizer};
use crate::services::turn::TurnOrchestrator;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Chat history store.
    pub store: Arc<AnyStore>,
    /// Known personas; read-only after startup.
    pub personas: Arc<PersonaRegistry>,
    /// Conversation turn pipeline.
    pub turns: Arc<TurnOrchestrator>,
    /// Landing page templates.
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    /// Wire the production upstream clients around `store`.
    pub fn new(config: Config, store: AnyStore) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(concat!("artifact-server/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(
            client.clone(),
            config.openai_base_url.clone(),
            config.openai_api_key.clone(),
        ));
        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(ElevenLabsSynthesizer::new(
            client.clone(),
            config.elevenlabs_base_url.clone(),
            config.elevenlabs_api_key.clone(),
        ));
        let storage: Arc<dyn ObjectStorage> = Arc::new(SupabaseStorage::new(
            client,
            config.storage_url.clone(),
            config.storage_key.clone(),
        ));

        Ok(Self::with_services(config, store, model, synthesizer, storage))
    }

    /// Assemble state from explicit capability implementations.
    pub fn with_services(
        config: Config,
        store: AnyStore,
        model: Arc<dyn ChatModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let personas = Arc::new(PersonaRegistry::from_config(&config));
        let speech = Arc::new(SpeechPublisher::new(
            synthesizer,
            storage,
            Arc::clone(&personas),
            config.audio_bucket.clone(),
        ));
        let store = Arc::new(store);
        let turns = Arc::new(TurnOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&personas),
            model,
            speech,
        ));
        let pages = Arc::new(PageRenderer::from_dir(&config.templates_dir));

        Self {
            config: Arc::new(config),
            store,
            personas,
            turns,
            pages,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over an in-memory store, the bundled templates and the given fakes.
    pub async fn for_tests(
        model: Arc<dyn ChatModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let config = Config::from_lookup(|key| match key {
            "ARTIFACT_TEMPLATES_DIR" => Some(concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_owned()),
            "ARTIFACT_STATIC_DIR" => Some(concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_owned()),
            "SUPABASE_URL" => Some("https://proj.supabase.co".to_owned()),
            _ => None,
        });
        Self::with_services(config, AnyStore::in_memory().await, model, synthesizer, storage)
    }
}
