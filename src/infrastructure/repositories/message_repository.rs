//! Message Repository Implementation
//!
//! PostgreSQL implementation of message persistence. Media attachments are
//! stored inline as a JSONB array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::{MediaItem, Message, MessageRepository, MessageTarget};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
/// Maps to the messages table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    recipient_id: Option<i64>,
    group_id: Option<i64>,
    content: String,
    media: Json<Vec<MediaItem>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts database row to domain Message entity.
    fn into_message(self) -> Result<Message, AppError> {
        let target = match (self.recipient_id, self.group_id) {
            (Some(recipient_id), None) => MessageTarget::Direct { recipient_id },
            (None, Some(group_id)) => MessageTarget::Group { group_id },
            _ => {
                return Err(AppError::Internal(format!(
                    "Message {} must have exactly one of recipient_id and group_id",
                    self.id
                )))
            }
        };

        Ok(Message {
            id: self.id,
            sender_id: self.sender_id,
            target,
            content: self.content,
            media: self.media.0,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, group_id, content, media, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sender_id, recipient_id, group_id, content, media, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.target.recipient_id())
        .bind(message.target.group_id())
        .bind(&message.content)
        .bind(Json(&message.media))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_message()
    }

    async fn find_conversation(
        &self,
        user_a: i64,
        user_b: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, content, media, created_at
            FROM messages
            WHERE ((sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1))
              AND ($3::BIGINT IS NULL OR id < $3)
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Fetched newest first so the limit keeps the latest page
        let mut messages = rows
            .into_iter()
            .map(MessageRow::into_message)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn find_for_recipient(
        &self,
        user_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, group_id, content, media, created_at
            FROM messages
            WHERE recipient_id = $1
              AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
