// Copyright 2025 Wayfare Labs Ltd.

//! Notification fan-out
//!
//! Best-effort, at-least-once delivery of ephemeral events to recipients who
//! poll instead of holding a connection. Queues are bounded per recipient
//! (oldest entries evicted first) and live only in process memory: a crash
//! loses them, and clients re-fetch authoritative state anyway.
//!
//! For a multi-instance deployment the same `poll(recipient, since)` contract
//! would be backed by an external broker or an outbox table instead.

use crate::errors::DomainResult;
use crate::events::DomainEvent;
use crate::identifiers::UserId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// The kind of state change a notification signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A booking changed state
    Booking,
    /// A message arrived in a booking thread
    Message,
    /// The guide reported a position
    Location,
}

/// A buffered notification awaiting a poll
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    /// What kind of change happened
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Event payload for the client's refresh logic
    pub payload: serde_json::Value,
    /// When the notification was published; also the poll cursor
    pub timestamp: DateTime<Utc>,
}

/// Per-recipient bounded notification queues
///
/// Publishing is not transactional with the state change that triggered it;
/// losing a notification is acceptable, clients poll authoritative state.
/// Duplicate delivery across overlapping polls is likewise acceptable.
pub struct NotificationHub {
    queues: RwLock<HashMap<UserId, VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationHub {
    /// Create a hub keeping at most `capacity` notifications per recipient
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Append a notification to the recipient's queue, evicting the oldest
    /// entries if the queue would exceed capacity
    pub fn publish(&self, recipient: UserId, kind: NotificationKind, payload: serde_json::Value) {
        let notification = Notification {
            kind,
            payload,
            timestamp: Utc::now(),
        };

        let mut queues = self.queues.write().unwrap();
        let queue = queues.entry(recipient).or_default();
        queue.push_back(notification);
        while queue.len() > self.capacity {
            queue.pop_front();
        }
        tracing::debug!(%recipient, queued = queue.len(), "notification published");
    }

    /// Serialize a domain event and publish it to the recipient
    ///
    /// The event's type name is stamped into the payload under `"event"` so
    /// polling clients can discriminate events within a kind.
    pub fn publish_event<E>(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        event: &E,
    ) -> DomainResult<()>
    where
        E: DomainEvent + Serialize,
    {
        let mut payload = serde_json::to_value(event)?;
        if let serde_json::Value::Object(ref mut fields) = payload {
            fields.insert(
                "event".to_string(),
                serde_json::Value::String(event.event_type().to_string()),
            );
        }
        self.publish(recipient, kind, payload);
        Ok(())
    }

    /// Return the recipient's buffered notifications strictly after `since`,
    /// oldest first; all of them when `since` is absent
    pub fn poll(&self, recipient: UserId, since: Option<DateTime<Utc>>) -> Vec<Notification> {
        let queues = self.queues.read().unwrap();
        let Some(queue) = queues.get(&recipient) else {
            return Vec::new();
        };

        match since {
            Some(cursor) => queue
                .iter()
                .filter(|n| n.timestamp > cursor)
                .cloned()
                .collect(),
            None => queue.iter().cloned().collect(),
        }
    }

    /// Drop the recipient's queue entirely
    pub fn clear(&self, recipient: UserId) {
        self.queues.write().unwrap().remove(&recipient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_and_poll_in_order() {
        let hub = NotificationHub::new(50);
        let recipient = UserId::new();

        hub.publish(recipient, NotificationKind::Booking, json!({"n": 1}));
        hub.publish(recipient, NotificationKind::Message, json!({"n": 2}));

        let events = hub.poll(recipient, None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload["n"], 1);
        assert_eq!(events[1].payload["n"], 2);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let hub = NotificationHub::new(3);
        let recipient = UserId::new();

        for n in 0..5 {
            hub.publish(recipient, NotificationKind::Booking, json!({ "n": n }));
        }

        let events = hub.poll(recipient, None);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].payload["n"], 2);
        assert_eq!(events[2].payload["n"], 4);
    }

    #[test]
    fn test_poll_since_is_strictly_after() {
        let hub = NotificationHub::new(50);
        let recipient = UserId::new();

        hub.publish(recipient, NotificationKind::Booking, json!({"n": 1}));
        let all = hub.poll(recipient, None);
        let cursor = all[0].timestamp;

        // The cursor entry itself is excluded.
        assert!(hub.poll(recipient, Some(cursor)).is_empty());

        hub.publish(recipient, NotificationKind::Booking, json!({"n": 2}));
        let newer = hub.poll(recipient, Some(cursor));
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].payload["n"], 2);
    }

    #[test]
    fn test_clear_drops_queue() {
        let hub = NotificationHub::new(50);
        let recipient = UserId::new();

        hub.publish(recipient, NotificationKind::Location, json!({}));
        hub.clear(recipient);
        assert!(hub.poll(recipient, None).is_empty());
    }

    #[test]
    fn test_recipients_are_isolated() {
        let hub = NotificationHub::new(50);
        let a = UserId::new();
        let b = UserId::new();

        hub.publish(a, NotificationKind::Booking, json!({}));
        assert_eq!(hub.poll(a, None).len(), 1);
        assert!(hub.poll(b, None).is_empty());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::Location).unwrap();
        assert_eq!(json, "\"location\"");
    }
}
