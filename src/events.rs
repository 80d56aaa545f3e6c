// Copyright 2025 Wayfare Labs Ltd.

//! Domain events
//!
//! Events are facts that already happened. The services turn them into
//! notification payloads for the fan-out; they carry exactly the data a
//! polling client needs to refresh its view.

use crate::booking::BookingStatus;
use crate::identifiers::{BookingId, GuideId, MessageId, TouristId, UserId};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;
}

/// A booking was created and awaits payment
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookingCreated {
    /// The new booking
    pub booking_id: BookingId,
    /// The booking tourist
    pub tourist_id: TouristId,
    /// The booked guide
    pub guide_id: GuideId,
    /// Initial status (always PENDING)
    pub status: BookingStatus,
    /// Total charged to the tourist
    pub total_price: f64,
}

impl DomainEvent for BookingCreated {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingCreated"
    }
}

/// Payment was confirmed by the payment collaborator's webhook
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookingConfirmed {
    /// The confirmed booking
    pub booking_id: BookingId,
    /// Opaque payment reference stored on the booking
    pub payment_intent_id: String,
}

impl DomainEvent for BookingConfirmed {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingConfirmed"
    }
}

/// The guide started the tour
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TourStarted {
    /// The booking whose tour started
    pub booking_id: BookingId,
    /// When it started
    pub start_time: DateTime<Utc>,
}

impl DomainEvent for TourStarted {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "TourStarted"
    }
}

/// The guide completed the tour
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TourCompleted {
    /// The booking whose tour completed
    pub booking_id: BookingId,
    /// When it ended
    pub end_time: DateTime<Utc>,
}

impl DomainEvent for TourCompleted {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "TourCompleted"
    }
}

/// A participant cancelled the booking
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookingCancelled {
    /// The cancelled booking
    pub booking_id: BookingId,
    /// Refund tier applied, as a fraction of the total price
    pub refund_percentage: f64,
    /// Amount refunded to the tourist
    pub refund_amount: f64,
}

impl DomainEvent for BookingCancelled {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingCancelled"
    }
}

/// A participant sent a message in the booking's thread
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageSent {
    /// The booking whose thread received the message
    pub booking_id: BookingId,
    /// The new message
    pub message_id: MessageId,
    /// Who sent it
    pub sender_id: UserId,
}

impl DomainEvent for MessageSent {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "MessageSent"
    }
}

/// The guide reported a position during an active tour
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocationPinged {
    /// The booking whose tour is in progress
    pub booking_id: BookingId,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl DomainEvent for LocationPinged {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "LocationPinged"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_carry_their_booking_id() {
        let booking_id = BookingId::new();
        let event = TourStarted {
            booking_id,
            start_time: Utc::now(),
        };
        assert_eq!(event.aggregate_id(), Uuid::from(booking_id));
        assert_eq!(event.event_type(), "TourStarted");
    }

    #[test]
    fn test_cancelled_event_serializes_refund_fields() {
        let event = BookingCancelled {
            booking_id: BookingId::new(),
            refund_percentage: 0.5,
            refund_amount: 50.0,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["refund_percentage"], 0.5);
        assert_eq!(value["refund_amount"], 50.0);
    }
}
