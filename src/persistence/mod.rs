// Copyright 2025 Wayfare Labs Ltd.

//! Persistence seams
//!
//! The engine depends on these traits, never on a concrete store. Each
//! aggregate is mutated only through its owning component's operations, so
//! the traits expose exactly the reads and writes those operations need and
//! nothing more.
//!
//! Two contracts matter beyond plain CRUD:
//!
//! - [`BookingRepository::transition`] is an atomic conditional update: the
//!   status check and the status write happen in one storage operation, so
//!   concurrent transitions on the same booking cannot both succeed.
//! - [`ReviewRepository::insert`] enforces uniqueness on the review's booking
//!   id inside the store, so concurrent submissions cannot both succeed.

mod memory;

pub use memory::{
    InMemoryBookingStore, InMemoryGuideStore, InMemoryLocationStore, InMemoryMessageStore,
    InMemoryReviewStore, InMemoryTouristStore,
};

use crate::booking::{Booking, BookingStatus};
use crate::errors::DomainResult;
use crate::guide::{Guide, Tourist};
use crate::identifiers::{BookingId, GuideId, TouristId, UserId};
use crate::location::LocationUpdate;
use crate::messaging::Message;
use crate::review::Review;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The field changes applied alongside a status transition
#[derive(Debug, Clone)]
pub struct TransitionChange {
    /// Target status
    pub to: BookingStatus,
    /// Set the tour's start time
    pub start_time: Option<DateTime<Utc>>,
    /// Set the tour's end time
    pub end_time: Option<DateTime<Utc>>,
    /// Store the payment collaborator's reference
    pub payment_intent_id: Option<String>,
}

impl TransitionChange {
    /// A transition to `status` changing nothing else
    pub fn to(status: BookingStatus) -> Self {
        Self {
            to: status,
            start_time: None,
            end_time: None,
            payment_intent_id: None,
        }
    }

    /// Also set the tour's start time
    pub fn with_start_time(mut self, at: DateTime<Utc>) -> Self {
        self.start_time = Some(at);
        self
    }

    /// Also set the tour's end time
    pub fn with_end_time(mut self, at: DateTime<Utc>) -> Self {
        self.end_time = Some(at);
        self
    }

    /// Also store the payment reference
    pub fn with_payment_intent_id(mut self, intent_id: impl Into<String>) -> Self {
        self.payment_intent_id = Some(intent_id.into());
        self
    }
}

/// Durable storage for bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking
    async fn insert(&self, booking: Booking) -> DomainResult<Booking>;

    /// Load a booking by id
    async fn find(&self, id: BookingId) -> DomainResult<Option<Booking>>;

    /// All bookings where this tourist is the booking party, newest first
    async fn list_for_tourist(&self, tourist_id: TouristId) -> DomainResult<Vec<Booking>>;

    /// All bookings assigned to this guide, newest first
    async fn list_for_guide(&self, guide_id: GuideId) -> DomainResult<Vec<Booking>>;

    /// Atomically transition a booking's status
    ///
    /// The legality check against the booking's *current* status and the
    /// write of the new status must be one storage operation (for SQL: an
    /// `UPDATE .. WHERE status IN (..)` on the legal source states). Returns
    /// the updated booking; fails with `NotFound` for an unknown id and
    /// `InvalidStateTransition` (carrying the actual current status) when the
    /// move is not legal.
    async fn transition(&self, id: BookingId, change: TransitionChange) -> DomainResult<Booking>;
}

/// Durable storage for guide profiles (engine-owned fields only)
#[async_trait]
pub trait GuideRepository: Send + Sync {
    /// Persist a new guide profile
    async fn insert(&self, guide: Guide) -> DomainResult<Guide>;

    /// Load a guide by profile id
    async fn find(&self, id: GuideId) -> DomainResult<Option<Guide>>;

    /// Load a guide by the platform user behind the profile
    async fn find_by_user(&self, user_id: UserId) -> DomainResult<Option<Guide>>;

    /// Flip the INSTANT-booking availability flag
    async fn set_available(&self, id: GuideId, is_available: bool) -> DomainResult<Guide>;

    /// Overwrite the derived rating fields
    ///
    /// Only the review component calls this, with values recomputed from the
    /// full review set; the fields are never independently mutable.
    async fn update_rating(
        &self,
        id: GuideId,
        average_rating: f64,
        total_reviews: u32,
    ) -> DomainResult<Guide>;
}

/// Durable storage for tourist profiles
#[async_trait]
pub trait TouristRepository: Send + Sync {
    /// Persist a new tourist profile
    async fn insert(&self, tourist: Tourist) -> DomainResult<Tourist>;

    /// Load a tourist by profile id
    async fn find(&self, id: TouristId) -> DomainResult<Option<Tourist>>;

    /// Load a tourist by the platform user behind the profile
    async fn find_by_user(&self, user_id: UserId) -> DomainResult<Option<Tourist>>;
}

/// Durable storage for booking thread messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message
    async fn insert(&self, message: Message) -> DomainResult<Message>;

    /// The booking's full thread in stable creation order, oldest first
    async fn list_for_booking(&self, booking_id: BookingId) -> DomainResult<Vec<Message>>;

    /// Mark every message in the thread not sent by `reader_id` as read,
    /// as one bulk update; returns how many messages were flipped
    async fn mark_read(&self, booking_id: BookingId, reader_id: UserId) -> DomainResult<u64>;
}

/// Durable storage for reviews
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Persist a new review
    ///
    /// Uniqueness on the review's booking id is enforced here, inside the
    /// store (for SQL: a unique constraint), so that of two concurrent
    /// submissions exactly one succeeds and the other fails with
    /// `DuplicateReview`.
    async fn insert(&self, review: Review) -> DomainResult<Review>;

    /// The booking's review, if one exists (at most one)
    async fn find_for_booking(&self, booking_id: BookingId) -> DomainResult<Option<Review>>;

    /// One page of the guide's reviews, newest first; `page` starts at 1
    async fn list_for_guide(
        &self,
        guide_id: GuideId,
        page: u32,
        limit: u32,
    ) -> DomainResult<Vec<Review>>;

    /// Every review the guide has received, for rating recomputation
    async fn list_all_for_guide(&self, guide_id: GuideId) -> DomainResult<Vec<Review>>;
}

/// Durable storage for location updates
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Append a location update (no mutation or deletion exists)
    async fn insert(&self, update: LocationUpdate) -> DomainResult<LocationUpdate>;

    /// Up to `limit` most recent updates for the booking, newest first
    async fn recent_for_booking(
        &self,
        booking_id: BookingId,
        limit: usize,
    ) -> DomainResult<Vec<LocationUpdate>>;
}
