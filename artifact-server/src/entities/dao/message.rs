use chrono::{DateTime, SecondsFormat, Utc};
use strum::{AsRefStr, Display, EnumString};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// `true` for the roles that make up a visitor conversation.
    pub fn is_conversational(self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

/// A single row in the `messages` table.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    /// Persona id exactly as the caller sent it.
    pub artifact_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: String,
    pub artifact_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(
        user_id: impl Into<String>,
        artifact_id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            artifact_id: artifact_id.into(),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Fixed-width RFC 3339 so that string order in the database is time order.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
