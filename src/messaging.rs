// Copyright 2025 Wayfare Labs Ltd.

//! Booking thread messaging
//!
//! Each booking carries one message thread between its two participants.
//! Authorization is relationship-based: the sender must be the booking's
//! tourist or guide, looked up through the booking read path.

use crate::booking_service::BookingService;
use crate::errors::{DomainError, DomainResult};
use crate::events::MessageSent;
use crate::identifiers::{BookingId, MessageId, UserId};
use crate::notifications::{NotificationHub, NotificationKind};
use crate::persistence::MessageRepository;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// A message in a booking's thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    /// Unique identifier
    pub id: MessageId,
    /// The booking whose thread this message belongs to
    pub booking_id: BookingId,
    /// The participant who sent it
    pub sender_id: UserId,
    /// Message body
    pub content: String,
    /// Whether the other participant has opened the thread since this arrived
    pub is_read: bool,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create an unread message
    pub fn new(booking_id: BookingId, sender_id: UserId, content: String) -> Self {
        Self {
            id: MessageId::new(),
            booking_id,
            sender_id,
            content,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Check the declared content constraints
pub fn validate_content(content: &str) -> DomainResult<()> {
    let chars = content.chars().count();
    if chars == 0 || chars > MAX_MESSAGE_CHARS {
        return Err(DomainError::validation(format!(
            "message content must be between 1 and {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Threaded per-booking messaging with read tracking
pub struct MessagingService {
    bookings: Arc<BookingService>,
    messages: Arc<dyn MessageRepository>,
    notifications: Arc<NotificationHub>,
}

impl MessagingService {
    /// Create the service with its collaborators
    pub fn new(
        bookings: Arc<BookingService>,
        messages: Arc<dyn MessageRepository>,
        notifications: Arc<NotificationHub>,
    ) -> Self {
        Self {
            bookings,
            messages,
            notifications,
        }
    }

    /// Send a message in the booking's thread
    ///
    /// The sender must be one of the booking's two participants; the other
    /// participant receives a `message` notification.
    pub async fn send(
        &self,
        booking_id: BookingId,
        sender_id: UserId,
        content: impl Into<String>,
    ) -> DomainResult<Message> {
        let content = content.into();
        validate_content(&content)?;

        let participants = self.bookings.participants(booking_id).await?;
        let Some(recipient) = participants.counterpart(sender_id) else {
            return Err(DomainError::forbidden(
                "only booking participants may message",
            ));
        };

        let message = self
            .messages
            .insert(Message::new(booking_id, sender_id, content))
            .await?;

        let event = MessageSent {
            booking_id,
            message_id: message.id,
            sender_id,
        };
        self.notifications
            .publish_event(recipient, NotificationKind::Message, &event)?;

        info!(%booking_id, message_id = %message.id, "message sent");
        Ok(message)
    }

    /// The booking's full thread, oldest first
    pub async fn list(&self, booking_id: BookingId) -> DomainResult<Vec<Message>> {
        // Existence check so an unknown booking is NotFound, not an empty thread.
        self.bookings.get(booking_id).await?;
        self.messages.list_for_booking(booking_id).await
    }

    /// Mark the other participant's messages as read
    ///
    /// One bulk update flipping every message in the thread whose sender is
    /// not `reader_id`. Returns how many messages were flipped.
    pub async fn mark_read(&self, booking_id: BookingId, reader_id: UserId) -> DomainResult<u64> {
        let participants = self.bookings.participants(booking_id).await?;
        if participants.counterpart(reader_id).is_none() {
            return Err(DomainError::forbidden(
                "only booking participants may mark the thread read",
            ));
        }

        let flipped = self.messages.mark_read(booking_id, reader_id).await?;
        debug!(%booking_id, flipped, "thread marked read");
        Ok(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_bounds() {
        assert!(validate_content("hi").is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content(&"x".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(validate_content(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_content_bounds_count_characters_not_bytes() {
        // 400 three-byte characters is 1200 bytes but well within 1000 chars.
        let content = "ツ".repeat(400);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn test_new_message_is_unread() {
        let message = Message::new(BookingId::new(), UserId::new(), "hello".to_string());
        assert!(!message.is_read);
    }
}
