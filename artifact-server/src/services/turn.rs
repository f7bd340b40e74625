//! Conversation turn orchestration.
//!
//! One turn: read the recent history window, build the prompt, ask the
//! persona's model, persist both sides of the exchange atomically and then
//! publish the spoken answer (best effort).
//!
//! The text path is strict: a model or database failure aborts the turn and
//! nothing is written. The audio path never fails the turn.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::entities::{AnyStore, Message, MessageStore, NewMessage, Role};
use crate::error::ServerError;
use crate::persona::PersonaRegistry;
use crate::services::llm::{ChatModel, PromptMessage};
use crate::services::speech::{AudioOutcome, SpeechPublisher};

/// Number of stored messages replayed to the model on each turn.
pub const MAX_HISTORY: u32 = 10;

/// Outcome of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub response: String,
    pub audio: AudioOutcome,
}

pub struct TurnOrchestrator {
    store: Arc<AnyStore>,
    personas: Arc<PersonaRegistry>,
    model: Arc<dyn ChatModel>,
    speech: Arc<SpeechPublisher>,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("speech", &self.speech)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    pub fn new(
        store: Arc<AnyStore>,
        personas: Arc<PersonaRegistry>,
        model: Arc<dyn ChatModel>,
        speech: Arc<SpeechPublisher>,
    ) -> Self {
        Self { store, personas, model, speech }
    }

    pub async fn handle_turn(
        &self,
        user_id: &str,
        artifact_id: &str,
        message: &str,
    ) -> Result<TurnReply, ServerError> {
        let recent = self
            .store
            .recent_messages(user_id, artifact_id, MAX_HISTORY)
            .await?;
        let window = conversation_window(recent);

        let model_name = self.personas.model_for(artifact_id);
        let prompt = build_prompt(self.personas.system_prompt_for(artifact_id), window, message);
        debug!(
            user_id,
            artifact_id,
            model = %model_name,
            prompt_len = prompt.len(),
            "requesting completion"
        );

        let answer = self.model.complete(model_name, &prompt).await?.trim().to_owned();

        let now = Utc::now();
        self.store
            .append_messages(vec![
                NewMessage::new(user_id, artifact_id, Role::User, message, now),
                NewMessage::new(user_id, artifact_id, Role::Assistant, answer.as_str(), now),
            ])
            .await?;

        let audio = self.speech.publish(&answer, artifact_id, user_id).await;
        match &audio {
            AudioOutcome::Published { url } => {
                info!(user_id, artifact_id, answer_len = answer.len(), audio_url = %url, "turn complete");
            }
            AudioOutcome::Failed { reason } => {
                info!(user_id, artifact_id, answer_len = answer.len(), audio_error = %reason, "turn complete without audio");
            }
        }

        Ok(TurnReply { response: answer, audio })
    }
}

/// Keep the user/assistant exchange of a chronological history slice.
pub fn conversation_window(history: Vec<Message>) -> Vec<PromptMessage> {
    history
        .into_iter()
        .filter(|m| {
            let keep = m.role.is_conversational();
            if !keep {
                debug!(
                    id = m.id,
                    user_id = %m.user_id,
                    role = %m.role,
                    timestamp = %m.timestamp,
                    "dropping non-conversational message from window"
                );
            }
            keep
        })
        .map(|m| PromptMessage::new(m.role, m.content))
        .collect()
}

/// `system`, then the window in order, then the new user message.
pub fn build_prompt(system_prompt: &str, window: Vec<PromptMessage>, message: &str) -> Vec<PromptMessage> {
    let mut prompt = Vec::with_capacity(window.len() + 2);
    prompt.push(PromptMessage::new(Role::System, system_prompt));
    prompt.extend(window);
    prompt.push(PromptMessage::new(Role::User, message));
    prompt
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::persona::DEFAULT_MODEL;
    use crate::services::testing::{
        FailingChatModel, FailingSynthesizer, FakeChatModel, FakeSynthesizer, MemoryStorage,
    };
    use chrono::{Duration, TimeZone};
    use tracing_test::traced_test;

    struct Harness {
        store: Arc<AnyStore>,
        model: Arc<FakeChatModel>,
        synth: Arc<FakeSynthesizer>,
        turns: TurnOrchestrator,
    }

    async fn harness(reply: &str) -> Harness {
        let store = Arc::new(AnyStore::in_memory().await);
        let personas = Arc::new(PersonaRegistry::from_config(&Config::from_lookup(|_| None)));
        let model = Arc::new(FakeChatModel::new(reply));
        let synth = Arc::new(FakeSynthesizer::new(vec![b"ID3".to_vec()]));
        let speech = Arc::new(SpeechPublisher::new(
            synth.clone(),
            Arc::new(MemoryStorage::new("https://proj.supabase.co")),
            personas.clone(),
            "minibox",
        ));
        let turns = TurnOrchestrator::new(store.clone(), personas, model.clone(), speech);
        Harness { store, model, synth, turns }
    }

    fn msg(role: Role, content: &str, secs: i64) -> Message {
        Message {
            id: secs,
            user_id: "u1".into(),
            artifact_id: "a".into(),
            role,
            content: content.into(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs),
        }
    }

    #[test]
    #[traced_test]
    fn window_drops_non_conversational_roles() {
        let window = conversation_window(vec![
            msg(Role::User, "hi", 0),
            msg(Role::System, "injected", 1),
            msg(Role::Assistant, "hello", 2),
        ]);
        let roles: Vec<_> = window.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert!(logs_contain("dropping non-conversational message from window"));
    }

    #[test]
    fn prompt_is_system_history_then_message() {
        let prompt = build_prompt(
            "be a lamp",
            vec![PromptMessage::new(Role::User, "old"), PromptMessage::new(Role::Assistant, "reply")],
            "new",
        );
        assert_eq!(
            prompt,
            vec![
                PromptMessage::new(Role::System, "be a lamp"),
                PromptMessage::new(Role::User, "old"),
                PromptMessage::new(Role::Assistant, "reply"),
                PromptMessage::new(Role::User, "new"),
            ]
        );
    }

    #[tokio::test]
    async fn successful_turn_persists_user_and_trimmed_answer() {
        let h = harness("  I have lit many rooms.\n").await;

        let reply = h.turns.handle_turn("u1", "a", "Who are you?").await.unwrap();

        assert_eq!(reply.response, "I have lit many rooms.");
        assert!(matches!(reply.audio, AudioOutcome::Published { .. }));

        let rows = h.store.recent_messages("u1", "a", 100).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].role, rows[0].content.as_str()), (Role::User, "Who are you?"));
        assert_eq!(
            (rows[1].role, rows[1].content.as_str()),
            (Role::Assistant, "I have lit many rooms.")
        );
    }

    #[tokio::test]
    async fn next_turn_sees_previous_turns_in_order() {
        let h = harness("answer {n}").await;

        h.turns.handle_turn("u1", "b", "M1").await.unwrap();
        h.turns.handle_turn("u1", "b", "M2").await.unwrap();
        h.turns.handle_turn("u1", "b", "M3").await.unwrap();

        let prompt = h.model.last_prompt();
        let tail: Vec<_> = prompt.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            tail,
            vec![
                (Role::System, h.turns.personas.system_prompt_for("b")),
                (Role::User, "M1"),
                (Role::Assistant, "answer 1"),
                (Role::User, "M2"),
                (Role::Assistant, "answer 2"),
                (Role::User, "M3"),
            ]
        );
    }

    #[tokio::test]
    async fn history_window_is_capped() {
        let h = harness("ok").await;
        for i in 0..8 {
            h.turns.handle_turn("u1", "a", &format!("question {i}")).await.unwrap();
        }

        h.turns.handle_turn("u1", "a", "last").await.unwrap();

        let prompt = h.model.last_prompt();
        // system + MAX_HISTORY + the new message
        assert_eq!(prompt.len(), MAX_HISTORY as usize + 2);
        assert_eq!(prompt[1].content, "question 3");
        assert_eq!(prompt[1].role, Role::User);
        assert_eq!(prompt.last().unwrap().content, "last");
    }

    #[tokio::test]
    async fn system_rows_in_history_are_not_replayed() {
        let h = harness("ok").await;
        h.store
            .append_messages(vec![NewMessage::new(
                "u1",
                "a",
                Role::System,
                "stale instruction",
                Utc::now() - Duration::seconds(5),
            )])
            .await
            .unwrap();

        h.turns.handle_turn("u1", "a", "hi").await.unwrap();

        let prompt = h.model.last_prompt();
        assert_eq!(prompt.len(), 2);
        assert!(prompt.iter().all(|m| m.content != "stale instruction"));
    }

    #[tokio::test]
    async fn model_failure_writes_nothing() {
        let store = Arc::new(AnyStore::in_memory().await);
        let personas = Arc::new(PersonaRegistry::from_config(&Config::from_lookup(|_| None)));
        let speech = Arc::new(SpeechPublisher::new(
            Arc::new(FakeSynthesizer::new(vec![b"ID3".to_vec()])),
            Arc::new(MemoryStorage::new("https://proj.supabase.co")),
            personas.clone(),
            "minibox",
        ));
        let turns = TurnOrchestrator::new(store.clone(), personas, Arc::new(FailingChatModel), speech);

        let err = turns.handle_turn("u1", "a", "hello").await.unwrap_err();

        assert!(matches!(err, ServerError::Upstream(_)));
        assert!(store.recent_messages("u1", "a", 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn speech_failure_keeps_text_answer() {
        let store = Arc::new(AnyStore::in_memory().await);
        let personas = Arc::new(PersonaRegistry::from_config(&Config::from_lookup(|_| None)));
        let speech = Arc::new(SpeechPublisher::new(
            Arc::new(FailingSynthesizer),
            Arc::new(MemoryStorage::new("https://proj.supabase.co")),
            personas.clone(),
            "minibox",
        ));
        let turns = TurnOrchestrator::new(
            store.clone(),
            personas,
            Arc::new(FakeChatModel::new("still here")),
            speech,
        );

        let reply = turns.handle_turn("u1", "a", "hello").await.unwrap();

        assert_eq!(reply.response, "still here");
        assert_eq!(reply.audio.clone().into_url(), None);
        assert_eq!(store.recent_messages("u1", "a", 100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_persona_uses_defaults() {
        let h = harness("hello from nowhere").await;

        let reply = h.turns.handle_turn("u1", "c", "hi").await.unwrap();

        assert_eq!(reply.response, "hello from nowhere");
        let (model, prompt) = h.model.calls().pop().unwrap();
        assert_eq!(model, DEFAULT_MODEL);
        assert_eq!(prompt[0], PromptMessage::new(Role::System, ""));
        assert_eq!(h.synth.voices(), vec!["AW5wrnG1jVizOYY7R1Oo".to_owned()]);
        assert_eq!(h.store.recent_messages("u1", "c", 100).await.unwrap().len(), 2);
    }
}
