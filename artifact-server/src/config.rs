//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Runtime configuration for artifact-server.
///
/// Every field has a default so the server starts without any environment
/// variables set; the upstream API keys are simply empty in that case and
/// the corresponding calls fail at request time.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// sqlx-compatible database URL (default: `"sqlite://artifact.db?mode=rwc"`).
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// Directory holding `a/index.html` and `b/index.html`.
    pub templates_dir: String,

    /// Directory served under `/static`.
    pub static_dir: String,

    /// Optional request timeout applied to every upstream HTTP client.
    pub upstream_timeout: Option<Duration>,

    pub openai_api_key: String,
    pub openai_base_url: String,

    pub elevenlabs_api_key: String,
    pub elevenlabs_base_url: String,

    /// Supabase project URL; also the prefix of every public audio URL.
    pub storage_url: String,
    pub storage_key: String,
    /// Bucket that receives synthesized clips.
    pub audio_bucket: String,

    /// Fine-tuned model for persona `a`; overrides the default model when set.
    pub ft_model_a: Option<String>,
    /// Fine-tuned model for persona `b`.
    pub ft_model_b: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        Self {
            bind_address: or("ARTIFACT_BIND", "0.0.0.0:8000"),
            database_url: or("ARTIFACT_DATABASE_URL", "sqlite://artifact.db?mode=rwc"),
            log_level: or("ARTIFACT_LOG", "info"),
            log_json: flag("ARTIFACT_LOG_JSON", false),
            cors_allowed_origins: non_empty("ARTIFACT_CORS_ORIGINS"),
            enable_docs: flag("ARTIFACT_ENABLE_DOCS", true),
            templates_dir: or("ARTIFACT_TEMPLATES_DIR", "templates"),
            static_dir: or("ARTIFACT_STATIC_DIR", "static"),
            upstream_timeout: lookup("ARTIFACT_UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            openai_api_key: or("OPENAI_API_KEY", ""),
            openai_base_url: trim_slash(or("OPENAI_BASE_URL", "https://api.openai.com/v1")),
            elevenlabs_api_key: or("ELEVENLABS_API_KEY", ""),
            elevenlabs_base_url: trim_slash(or("ELEVENLABS_BASE_URL", "https://api.elevenlabs.io")),
            storage_url: trim_slash(or("SUPABASE_URL", "")),
            storage_key: or("SUPABASE_KEY", ""),
            audio_bucket: or("ARTIFACT_AUDIO_BUCKET", "minibox"),
            ft_model_a: non_empty("FT_MODEL_A"),
            ft_model_b: non_empty("FT_MODEL_B"),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
