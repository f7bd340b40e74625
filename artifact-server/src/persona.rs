//! Persona registry.
//!
//! Each artifact persona carries its own system prompt, chat model and
//! ElevenLabs voice. The registry is built once from [`Config`] at startup and
//! shared read-only through [`crate::state::AppState`].

use serde::Serialize;

use crate::config::Config;

/// Model used when no fine-tuned model is configured, and for unknown personas.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Persona whose voice is used for unknown persona ids.
pub const FALLBACK_VOICE_PERSONA: &str = "a";

/// ElevenLabs voice settings, serialized as the API expects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

/// A voice id plus its tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub voice_id: String,
    pub settings: VoiceSettings,
}

#[derive(Debug, Clone)]
pub struct Persona {
    pub id: &'static str,
    pub system_prompt: String,
    pub model_name: String,
    pub voice: Voice,
}

/// Immutable lookup table of the known personas.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Build the two built-in personas, applying the fine-tuned model
    /// overrides from `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        let model = |ft: &Option<String>| ft.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned());

        Self {
            personas: vec![
                Persona {
                    id: "a",
                    system_prompt: LAMP_PROMPT.to_owned(),
                    model_name: model(&cfg.ft_model_a),
                    voice: Voice {
                        voice_id: "AW5wrnG1jVizOYY7R1Oo".into(),
                        settings: VoiceSettings {
                            stability: 0.3,
                            similarity_boost: 0.8,
                            style: 0.0,
                            use_speaker_boost: true,
                        },
                    },
                },
                Persona {
                    id: "b",
                    system_prompt: TILE_PROMPT.to_owned(),
                    model_name: model(&cfg.ft_model_b),
                    voice: Voice {
                        voice_id: "EXAVITQu4vr4xnSDxMaL".into(),
                        settings: VoiceSettings {
                            stability: 0.5,
                            similarity_boost: 0.7,
                            style: 0.2,
                            use_speaker_boost: false,
                        },
                    },
                },
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.personas.iter().map(|p| p.id)
    }

    /// Model for `id`, or [`DEFAULT_MODEL`] when the persona is unknown.
    pub fn model_for(&self, id: &str) -> &str {
        self.get(id).map_or(DEFAULT_MODEL, |p| p.model_name.as_str())
    }

    /// System prompt for `id`, or `""` when the persona is unknown.
    pub fn system_prompt_for(&self, id: &str) -> &str {
        self.get(id).map_or("", |p| p.system_prompt.as_str())
    }

    /// Voice for `id`, falling back to persona `a`'s voice.
    pub fn voice_for(&self, id: &str) -> &Voice {
        let persona = self
            .get(id)
            .or_else(|| self.get(FALLBACK_VOICE_PERSONA))
            .unwrap_or(&self.personas[0]);
        &persona.voice
    }
}

const LAMP_PROMPT: &str = "You are 'Baekja Horong', a white porcelain oil lamp from the Joseon \
dynasty, now resting in a museum display case. Speak in the first person as the lamp. \
Share memories of the scholars' rooms you once lit, the craft of the potters who shaped you, \
and the quiet nights you kept watch over. Keep answers warm, brief (two to four sentences) \
and suitable for museum visitors of any age. If asked something you could not know as a lamp, \
say so gently and steer back to your story.";

const TILE_PROMPT: &str = "You are 'Hwamun Giwa', a flower-patterned roof tile from an ancient \
Korean palace, now exhibited in a museum. Speak in the first person as the tile. Describe the \
roofs you protected, the lotus pattern pressed into your face, the seasons and storms you \
endured and the people who passed beneath you. Be lively and curious, answer in two to four \
sentences, and keep the conversation suitable for museum visitors of any age. If asked \
something a roof tile could not know, admit it playfully and return to your story.";

// ── Tests ──────────────────────────────────────────────────────────────────────
