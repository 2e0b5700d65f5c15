//! Message Router
//!
//! Persists a message, then delivers it to exactly the intended audience:
//! the recipient's live connections for a direct message, the group's
//! subscribers for a group message. An unreachable direct recipient gets a
//! push notification instead.

use std::sync::Arc;

use chrono::Utc;

use crate::application::realtime::{
    ConnectionRegistry, DirectMessageEvent, GroupMessageEvent, GroupOverlay, ServerEvent,
};
use crate::domain::{
    DeviceTokenRepository, Identity, MediaItem, Message, MessageRepository, MessageTarget,
    PushError, PushGateway, PushNotification,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Longest accepted message text, in characters.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 4000;

/// Most media attachments a single message may carry.
pub const MAX_MEDIA_ITEMS: usize = 10;

/// Router errors
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Message must have content or media")]
    EmptyContent,

    #[error("Message content exceeds {max} characters")]
    ContentTooLong { max: usize },

    #[error("At most {max} media items per message")]
    TooManyMedia { max: usize },

    /// Nothing was delivered
    #[error("Message could not be stored: {0}")]
    Persistence(#[source] AppError),
}

impl From<RouterError> for AppError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::EmptyContent
            | RouterError::ContentTooLong { .. }
            | RouterError::TooManyMedia { .. } => {
                AppError::BadRequest(err.to_string())
            }
            RouterError::Persistence(inner) => inner,
        }
    }
}

/// How a stored direct message reached (or did not reach) its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Sent to this many live connections
    Delivered { connections: usize },
    /// Recipient offline; handed to the push gateway
    Pushed,
    /// Recipient offline with no usable device token, or the push failed
    NotNotified,
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Pushed => "pushed",
            Self::NotNotified => "offline",
        }
    }
}

/// Result of a direct send.
#[derive(Debug, Clone)]
pub struct DirectDelivery {
    pub message: Message,
    pub outcome: DeliveryOutcome,
}

/// Result of a group send.
#[derive(Debug, Clone)]
pub struct GroupDelivery {
    pub message: Message,
    /// Subscribed connections the event was queued on
    pub connections: usize,
}

pub struct MessageRouter<M, D, P>
where
    M: MessageRepository,
    D: DeviceTokenRepository,
    P: PushGateway,
{
    messages: Arc<M>,
    device_tokens: Arc<D>,
    push: Arc<P>,
    registry: Arc<ConnectionRegistry>,
    overlay: Arc<GroupOverlay>,
    id_generator: Arc<SnowflakeGenerator>,
    max_content_length: usize,
}

impl<M, D, P> MessageRouter<M, D, P>
where
    M: MessageRepository,
    D: DeviceTokenRepository,
    P: PushGateway,
{
    pub fn new(
        messages: Arc<M>,
        device_tokens: Arc<D>,
        push: Arc<P>,
        registry: Arc<ConnectionRegistry>,
        overlay: Arc<GroupOverlay>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            messages,
            device_tokens,
            push,
            registry,
            overlay,
            id_generator,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }

    pub fn with_max_content_length(mut self, max: usize) -> Self {
        self.max_content_length = max;
        self
    }

    /// Store and deliver a direct message.
    pub async fn route_direct(
        &self,
        sender: &Identity,
        recipient_id: i64,
        content: String,
        media: Vec<MediaItem>,
    ) -> Result<DirectDelivery, RouterError> {
        let message = self
            .persist(sender, MessageTarget::Direct { recipient_id }, content, media)
            .await?;

        // The recipient may have come or gone while the insert was in flight.
        let event = ServerEvent::DirectMessage(DirectMessageEvent::from_message(
            &message,
            &sender.username,
        ));
        let connections = self.registry.send_to_user(recipient_id, &event);

        let outcome = if connections > 0 {
            DeliveryOutcome::Delivered { connections }
        } else {
            self.notify_offline(sender, recipient_id, &message).await
        };

        metrics::record_message_routed("direct", outcome.label());
        tracing::info!(
            message_id = message.id,
            sender_id = sender.user_id,
            recipient_id,
            outcome = outcome.label(),
            "Direct message routed"
        );

        Ok(DirectDelivery { message, outcome })
    }

    /// Store a group message and fan it out to the group's subscribers.
    ///
    /// Membership is the caller's concern.
    pub async fn route_group(
        &self,
        sender: &Identity,
        group_id: i64,
        content: String,
        media: Vec<MediaItem>,
    ) -> Result<GroupDelivery, RouterError> {
        let message = self
            .persist(sender, MessageTarget::Group { group_id }, content, media)
            .await?;

        let event = ServerEvent::MessageReceived(GroupMessageEvent::from_message(
            &message,
            group_id,
            &sender.username,
        ));
        let connections = self.overlay.publish(group_id, &event);

        metrics::record_message_routed("group", "delivered");
        tracing::info!(
            message_id = message.id,
            sender_id = sender.user_id,
            group_id,
            connections,
            "Group message routed"
        );

        Ok(GroupDelivery {
            message,
            connections,
        })
    }

    fn validate(&self, content: &str, media: &[MediaItem]) -> Result<(), RouterError> {
        if content.trim().is_empty() && media.is_empty() {
            return Err(RouterError::EmptyContent);
        }
        if content.chars().count() > self.max_content_length {
            return Err(RouterError::ContentTooLong {
                max: self.max_content_length,
            });
        }
        if media.len() > MAX_MEDIA_ITEMS {
            return Err(RouterError::TooManyMedia {
                max: MAX_MEDIA_ITEMS,
            });
        }
        Ok(())
    }

    async fn persist(
        &self,
        sender: &Identity,
        target: MessageTarget,
        content: String,
        media: Vec<MediaItem>,
    ) -> Result<Message, RouterError> {
        self.validate(&content, &media)?;

        let message = Message {
            id: self.id_generator.generate(),
            sender_id: sender.user_id,
            target,
            content,
            media,
            created_at: Utc::now(),
        };

        self.messages.create(&message).await.map_err(|e| {
            metrics::record_message_routed(target.kind(), "persist_failed");
            tracing::error!(
                sender_id = sender.user_id,
                target = target.kind(),
                error = %e,
                "Failed to store message"
            );
            RouterError::Persistence(e)
        })
    }

    async fn notify_offline(
        &self,
        sender: &Identity,
        recipient_id: i64,
        message: &Message,
    ) -> DeliveryOutcome {
        let token = match self.device_tokens.find_by_user(recipient_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                metrics::record_push("no_token");
                tracing::debug!(recipient_id, "Recipient offline without device token");
                return DeliveryOutcome::NotNotified;
            }
            Err(e) => {
                metrics::record_push("lookup_failed");
                tracing::warn!(recipient_id, error = %e, "Device token lookup failed");
                return DeliveryOutcome::NotNotified;
            }
        };

        let notification = PushNotification::for_direct_message(&sender.username, message);
        match self.push.send(&token, &notification).await {
            Ok(()) => {
                metrics::record_push("sent");
                DeliveryOutcome::Pushed
            }
            Err(PushError::Disabled) => {
                metrics::record_push("disabled");
                DeliveryOutcome::NotNotified
            }
            Err(e) => {
                metrics::record_push("failed");
                tracing::warn!(
                    recipient_id,
                    message_id = message.id,
                    error = %e,
                    "Push notification failed"
                );
                DeliveryOutcome::NotNotified
            }
        }
    }
}
