//! Message History
//!
//! Read side of stored direct messages: one conversation between two users
//! and a user's inbox. Pages are walked backwards with a `before` message id.

use std::sync::Arc;

use crate::domain::{Identity, Message, MessageRepository};
use crate::shared::error::AppError;

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Cursor and size of one history page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub before: Option<i64>,
    pub limit: Option<i64>,
}

impl HistoryPage {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

pub struct MessageHistoryService<M>
where
    M: MessageRepository,
{
    messages: Arc<M>,
}

impl<M> MessageHistoryService<M>
where
    M: MessageRepository,
{
    pub fn new(messages: Arc<M>) -> Self {
        Self { messages }
    }

    /// Messages between the caller and `other_user_id`, oldest first.
    pub async fn conversation(
        &self,
        identity: &Identity,
        other_user_id: i64,
        page: HistoryPage,
    ) -> Result<Vec<Message>, AppError> {
        let messages = self
            .messages
            .find_conversation(identity.user_id, other_user_id, page.before, page.limit())
            .await?;
        tracing::debug!(
            user_id = identity.user_id,
            other_user_id,
            count = messages.len(),
            "Conversation loaded"
        );
        Ok(messages)
    }

    /// Messages addressed to the caller, newest first.
    pub async fn inbox(
        &self,
        identity: &Identity,
        page: HistoryPage,
    ) -> Result<Vec<Message>, AppError> {
        self.messages
            .find_for_recipient(identity.user_id, page.before, page.limit())
            .await
    }
}
