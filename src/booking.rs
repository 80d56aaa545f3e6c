// Copyright 2025 Wayfare Labs Ltd.

//! Booking aggregate
//!
//! The central aggregate of the marketplace. A booking is created PENDING by
//! a tourist, mutated only through [`crate::booking_service::BookingService`],
//! and never hard-deleted: cancellation is a status transition.

use crate::entity::AggregateRoot;
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::{BookingId, GuideId, TourId, TouristId};
use crate::policy::CommissionSplit;
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum tour duration in minutes
pub const MIN_DURATION_MINUTES: u32 = 30;

/// Minimum meeting point description length in characters
pub const MIN_MEETING_POINT_CHARS: usize = 5;

/// How a booking was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingType {
    /// Immediate booking, requires the guide to be available right now
    Instant,
    /// Future-dated booking with a scheduled date
    Scheduled,
}

/// Lifecycle states of a booking
///
/// ```text
/// PENDING --(payment confirmed)--> CONFIRMED
/// PENDING --(cancel)--> CANCELLED
/// CONFIRMED --(guide starts)--> STARTED
/// CONFIRMED --(cancel)--> CANCELLED
/// STARTED --(guide completes)--> COMPLETED
/// STARTED --(cancel)--> CANCELLED
/// COMPLETED, CANCELLED, REFUNDED: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    /// Created, awaiting payment confirmation
    Pending,
    /// Payment confirmed, awaiting tour start
    Confirmed,
    /// Tour in progress
    Started,
    /// Terminal: tour finished
    Completed,
    /// Terminal: cancelled before completion
    Cancelled,
    /// Terminal: refund settled outside the cancel flow
    Refunded,
}

impl State for BookingStatus {
    fn name(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Started => "STARTED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }
}

impl StateTransitions for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStatus::*;

        match self {
            Pending => vec![Confirmed, Cancelled],
            Confirmed => vec![Started, Cancelled],
            Started => vec![Completed, Cancelled],
            Completed | Cancelled | Refunded => vec![],
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tourist's booking of a guide, with the money split computed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    /// The tourist who booked
    pub tourist_id: TouristId,
    /// The guide who was booked
    pub guide_id: GuideId,
    /// The tour offering, if this books an exclusive offering rather than ad hoc time
    pub tour_id: Option<TourId>,
    /// How the booking was initiated
    pub booking_type: BookingType,
    /// Current lifecycle state
    pub status: BookingStatus,
    /// Scheduled start, present iff the booking is SCHEDULED
    pub scheduled_date: Option<DateTime<Utc>>,
    /// When the tour actually started
    pub start_time: Option<DateTime<Utc>>,
    /// When the tour actually ended
    pub end_time: Option<DateTime<Utc>>,
    /// Tour length in minutes
    pub duration_minutes: u32,
    /// Where the guide meets the tourist
    pub meeting_point: String,
    /// Total charged to the tourist
    pub total_price: f64,
    /// Platform's cut of the total price
    pub commission: f64,
    /// Remainder owed to the guide
    pub guide_earnings: f64,
    /// Opaque payment-collaborator reference, set once payment is confirmed
    pub payment_intent_id: Option<String>,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
    /// When the booking was last mutated
    pub updated_at: DateTime<Utc>,
    version: u64,
}

/// Input for creating a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    /// The tourist requesting the booking
    pub tourist_id: TouristId,
    /// The guide being booked
    pub guide_id: GuideId,
    /// Optional tour offering
    pub tour_id: Option<TourId>,
    /// INSTANT or SCHEDULED
    pub booking_type: BookingType,
    /// Required for SCHEDULED, absent for INSTANT
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Tour length in minutes
    pub duration_minutes: u32,
    /// Where the guide meets the tourist
    pub meeting_point: String,
    /// Total price to charge
    pub total_price: f64,
}

impl NewBooking {
    /// Validate declared input constraints
    pub fn validate(&self) -> DomainResult<()> {
        if self.duration_minutes < MIN_DURATION_MINUTES {
            return Err(DomainError::validation(format!(
                "duration must be at least {MIN_DURATION_MINUTES} minutes"
            )));
        }
        if self.meeting_point.trim().chars().count() < MIN_MEETING_POINT_CHARS {
            return Err(DomainError::validation(format!(
                "meeting point must be at least {MIN_MEETING_POINT_CHARS} characters"
            )));
        }
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(DomainError::validation(
                "total price must be a non-negative amount",
            ));
        }
        match self.booking_type {
            BookingType::Scheduled if self.scheduled_date.is_none() => Err(
                DomainError::validation("scheduled bookings require a scheduled date"),
            ),
            BookingType::Instant if self.scheduled_date.is_some() => Err(
                DomainError::validation("instant bookings cannot carry a scheduled date"),
            ),
            _ => Ok(()),
        }
    }
}

impl Booking {
    /// Create a PENDING booking from validated input and a computed split
    pub fn create(input: NewBooking, split: CommissionSplit) -> DomainResult<Self> {
        input.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: BookingId::new(),
            tourist_id: input.tourist_id,
            guide_id: input.guide_id,
            tour_id: input.tour_id,
            booking_type: input.booking_type,
            status: BookingStatus::Pending,
            scheduled_date: input.scheduled_date,
            start_time: None,
            end_time: None,
            duration_minutes: input.duration_minutes,
            meeting_point: input.meeting_point,
            total_price: input.total_price,
            commission: split.commission,
            guide_earnings: split.guide_earnings,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }
}

impl AggregateRoot for Booking {
    type Id = BookingId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}
