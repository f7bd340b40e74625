use std::future::Future;
use std::str::FromStr;

use chrono::Utc;

use crate::entities::dao::message::encode_timestamp;
use crate::entities::{AnyStore, Message, NewMessage, Role};

pub trait MessageStore: Send + Sync + 'static {
    /// The `limit` most recent messages of one conversation, oldest first.
    fn recent_messages(
        &self,
        user_id: &str,
        artifact_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Message>, sqlx::Error>> + Send;

    /// Write all `messages` in one transaction, in order.
    ///
    /// Either every row is committed or none is.
    fn append_messages(
        &self,
        messages: Vec<NewMessage>,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

type MessageRow = (i64, String, String, String, String, String);

impl MessageStore for AnyStore {
    async fn recent_messages(
        &self,
        user_id: &str,
        artifact_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, user_id, artifact_id, role, content, timestamp \
             FROM messages WHERE user_id = ?1 AND artifact_id = ?2 \
             ORDER BY timestamp DESC, id DESC LIMIT ?3",
        )
        .bind(user_id)
        .bind(artifact_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        // Newest-first from the query; callers want chronological order.
        Ok(rows.into_iter().rev().filter_map(decode_row).collect())
    }

    async fn append_messages(&self, messages: Vec<NewMessage>) -> Result<(), sqlx::Error> {
        // Dropping an uncommitted transaction rolls it back.
        let mut tx = self.pool.begin().await?;
        for msg in &messages {
            sqlx::query(
                "INSERT INTO messages (user_id, artifact_id, role, content, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&msg.user_id)
            .bind(&msg.artifact_id)
            .bind(msg.role.as_ref())
            .bind(&msg.content)
            .bind(encode_timestamp(&msg.timestamp))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn decode_row((id, user_id, artifact_id, role, content, timestamp): MessageRow) -> Option<Message> {
    let role = match Role::from_str(&role) {
        Ok(r) => r,
        Err(_) => {
            tracing::warn!(id, raw = %role, "skipping message with unknown role");
            return None;
        }
    };
    let timestamp = timestamp.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %timestamp, error = %e, "failed to parse message timestamp; using now");
        Utc::now()
    });
    Some(Message {
        id,
        user_id,
        artifact_id,
        role,
        content,
        timestamp,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
