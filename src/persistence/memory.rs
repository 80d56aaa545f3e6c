// Copyright 2025 Wayfare Labs Ltd.

//! In-memory stores
//!
//! Used by tests and single-process deployments. Each store serializes its
//! writes behind one `RwLock`, which is what makes the conditional-transition
//! and unique-review contracts hold: the check and the write share a critical
//! section, exactly as a SQL implementation would put them in one statement.

use crate::booking::Booking;
use crate::entity::AggregateRoot;
use crate::errors::{DomainError, DomainResult};
use crate::guide::{Guide, Tourist};
use crate::identifiers::{BookingId, GuideId, TouristId, UserId};
use crate::location::LocationUpdate;
use crate::messaging::Message;
use crate::persistence::{
    BookingRepository, GuideRepository, LocationRepository, MessageRepository, ReviewRepository,
    TouristRepository, TransitionChange,
};
use crate::review::Review;
use crate::state_machine::guard_transition;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory booking store
#[derive(Default)]
pub struct InMemoryBookingStore {
    rows: RwLock<IndexMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingStore {
    async fn insert(&self, booking: Booking) -> DomainResult<Booking> {
        let mut rows = self.rows.write().await;
        rows.insert(booking.id.into(), booking.clone());
        Ok(booking)
    }

    async fn find(&self, id: BookingId) -> DomainResult<Option<Booking>> {
        Ok(self.rows.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn list_for_tourist(&self, tourist_id: TouristId) -> DomainResult<Vec<Booking>> {
        let rows = self.rows.read().await;
        let mut bookings: Vec<Booking> = rows
            .values()
            .filter(|b| b.tourist_id == tourist_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_for_guide(&self, guide_id: GuideId) -> DomainResult<Vec<Booking>> {
        let rows = self.rows.read().await;
        let mut bookings: Vec<Booking> = rows
            .values()
            .filter(|b| b.guide_id == guide_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn transition(&self, id: BookingId, change: TransitionChange) -> DomainResult<Booking> {
        let mut rows = self.rows.write().await;
        let booking = rows
            .get_mut(&Uuid::from(id))
            .ok_or_else(|| DomainError::booking_not_found(id))?;

        // Same critical section as the write below, so concurrent
        // transitions on one booking cannot both pass the guard.
        guard_transition(&booking.status, &change.to)?;

        booking.status = change.to;
        if let Some(at) = change.start_time {
            booking.start_time = Some(at);
        }
        if let Some(at) = change.end_time {
            booking.end_time = Some(at);
        }
        if let Some(intent_id) = change.payment_intent_id {
            booking.payment_intent_id = Some(intent_id);
        }
        booking.updated_at = Utc::now();
        booking.increment_version();

        Ok(booking.clone())
    }
}

/// In-memory guide profile store
#[derive(Default)]
pub struct InMemoryGuideStore {
    rows: RwLock<IndexMap<Uuid, Guide>>,
}

impl InMemoryGuideStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuideRepository for InMemoryGuideStore {
    async fn insert(&self, guide: Guide) -> DomainResult<Guide> {
        let mut rows = self.rows.write().await;
        rows.insert(guide.id.into(), guide.clone());
        Ok(guide)
    }

    async fn find(&self, id: GuideId) -> DomainResult<Option<Guide>> {
        Ok(self.rows.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> DomainResult<Option<Guide>> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|g| g.user_id == user_id).cloned())
    }

    async fn set_available(&self, id: GuideId, is_available: bool) -> DomainResult<Guide> {
        let mut rows = self.rows.write().await;
        let guide = rows
            .get_mut(&Uuid::from(id))
            .ok_or_else(|| DomainError::guide_not_found(id))?;
        guide.is_available = is_available;
        guide.updated_at = Utc::now();
        guide.increment_version();
        Ok(guide.clone())
    }

    async fn update_rating(
        &self,
        id: GuideId,
        average_rating: f64,
        total_reviews: u32,
    ) -> DomainResult<Guide> {
        let mut rows = self.rows.write().await;
        let guide = rows
            .get_mut(&Uuid::from(id))
            .ok_or_else(|| DomainError::guide_not_found(id))?;
        guide.average_rating = average_rating;
        guide.total_reviews = total_reviews;
        guide.updated_at = Utc::now();
        guide.increment_version();
        Ok(guide.clone())
    }
}

/// In-memory tourist profile store
#[derive(Default)]
pub struct InMemoryTouristStore {
    rows: RwLock<IndexMap<Uuid, Tourist>>,
}

impl InMemoryTouristStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TouristRepository for InMemoryTouristStore {
    async fn insert(&self, tourist: Tourist) -> DomainResult<Tourist> {
        let mut rows = self.rows.write().await;
        rows.insert(tourist.id.into(), tourist.clone());
        Ok(tourist)
    }

    async fn find(&self, id: TouristId) -> DomainResult<Option<Tourist>> {
        Ok(self.rows.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> DomainResult<Option<Tourist>> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|t| t.user_id == user_id).cloned())
    }
}

/// In-memory message store
#[derive(Default)]
pub struct InMemoryMessageStore {
    rows: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn insert(&self, message: Message) -> DomainResult<Message> {
        self.rows.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_for_booking(&self, booking_id: BookingId) -> DomainResult<Vec<Message>> {
        let rows = self.rows.read().await;
        let mut thread: Vec<Message> = rows
            .iter()
            .filter(|m| m.booking_id == booking_id)
            .cloned()
            .collect();
        thread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(thread)
    }

    async fn mark_read(&self, booking_id: BookingId, reader_id: UserId) -> DomainResult<u64> {
        let mut rows = self.rows.write().await;
        let mut flipped = 0;
        for message in rows
            .iter_mut()
            .filter(|m| m.booking_id == booking_id && m.sender_id != reader_id && !m.is_read)
        {
            message.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

/// In-memory review store
#[derive(Default)]
pub struct InMemoryReviewStore {
    rows: RwLock<IndexMap<Uuid, Review>>,
}

impl InMemoryReviewStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewStore {
    async fn insert(&self, review: Review) -> DomainResult<Review> {
        let mut rows = self.rows.write().await;
        // Uniqueness check and insert share the write lock, mirroring a
        // unique constraint: one of two concurrent inserts loses.
        if rows.values().any(|r| r.booking_id == review.booking_id) {
            return Err(DomainError::DuplicateReview {
                booking_id: review.booking_id.to_string(),
            });
        }
        rows.insert(review.id.into(), review.clone());
        Ok(review)
    }

    async fn find_for_booking(&self, booking_id: BookingId) -> DomainResult<Option<Review>> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|r| r.booking_id == booking_id).cloned())
    }

    async fn list_for_guide(
        &self,
        guide_id: GuideId,
        page: u32,
        limit: u32,
    ) -> DomainResult<Vec<Review>> {
        let mut reviews = self.list_all_for_guide(guide_id).await?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = (page as usize - 1) * limit as usize;
        Ok(reviews
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }

    async fn list_all_for_guide(&self, guide_id: GuideId) -> DomainResult<Vec<Review>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|r| r.guide_id == guide_id)
            .cloned()
            .collect())
    }
}

/// In-memory location update store
#[derive(Default)]
pub struct InMemoryLocationStore {
    rows: RwLock<Vec<LocationUpdate>>,
}

impl InMemoryLocationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationStore {
    async fn insert(&self, update: LocationUpdate) -> DomainResult<LocationUpdate> {
        self.rows.write().await.push(update.clone());
        Ok(update)
    }

    async fn recent_for_booking(
        &self,
        booking_id: BookingId,
        limit: usize,
    ) -> DomainResult<Vec<LocationUpdate>> {
        let rows = self.rows.read().await;
        let mut updates: Vec<LocationUpdate> = rows
            .iter()
            .filter(|u| u.booking_id == booking_id)
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        updates.truncate(limit);
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookingStatus, BookingType, NewBooking};
    use crate::identifiers::ReviewId;
    use crate::policy::{split_commission, DEFAULT_COMMISSION_RATE};

    fn pending_booking() -> Booking {
        let input = NewBooking {
            tourist_id: TouristId::new(),
            guide_id: GuideId::new(),
            tour_id: None,
            booking_type: BookingType::Instant,
            scheduled_date: None,
            duration_minutes: 60,
            meeting_point: "Main station clock".to_string(),
            total_price: 80.0,
        };
        let split = split_commission(input.total_price, DEFAULT_COMMISSION_RATE);
        Booking::create(input, split).unwrap()
    }

    #[tokio::test]
    async fn test_transition_applies_change_atomically() {
        let store = InMemoryBookingStore::new();
        let booking = store.insert(pending_booking()).await.unwrap();

        let confirmed = store
            .transition(
                booking.id,
                TransitionChange::to(BookingStatus::Confirmed).with_payment_intent_id("pi_1"),
            )
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.payment_intent_id.as_deref(), Some("pi_1"));
        assert!(confirmed.updated_at >= booking.updated_at);
    }

    #[tokio::test]
    async fn test_transition_refuses_illegal_move_with_actual_state() {
        let store = InMemoryBookingStore::new();
        let booking = store.insert(pending_booking()).await.unwrap();

        let err = store
            .transition(booking.id, TransitionChange::to(BookingStatus::Started))
            .await
            .unwrap_err();
        match err {
            DomainError::InvalidStateTransition { from, to } => {
                assert_eq!(from, "PENDING");
                assert_eq!(to, "STARTED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transition_unknown_booking_is_not_found() {
        let store = InMemoryBookingStore::new();
        let err = store
            .transition(BookingId::new(), TransitionChange::to(BookingStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_review_store_enforces_one_per_booking() {
        let store = InMemoryReviewStore::new();
        let booking_id = BookingId::new();
        let guide_id = GuideId::new();
        let make_review = |rating| Review {
            id: ReviewId::new(),
            booking_id,
            tourist_id: TouristId::new(),
            guide_id,
            rating,
            comment: None,
            created_at: Utc::now(),
        };

        store.insert(make_review(5)).await.unwrap();
        let err = store.insert(make_review(3)).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReview { .. }));
        assert_eq!(store.list_all_for_guide(guide_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_flips_only_the_other_partys_messages() {
        let store = InMemoryMessageStore::new();
        let booking_id = BookingId::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store
            .insert(Message::new(booking_id, alice, "hi".to_string()))
            .await
            .unwrap();
        store
            .insert(Message::new(booking_id, bob, "hello".to_string()))
            .await
            .unwrap();
        store
            .insert(Message::new(booking_id, bob, "you there?".to_string()))
            .await
            .unwrap();

        let flipped = store.mark_read(booking_id, alice).await.unwrap();
        assert_eq!(flipped, 2);

        let thread = store.list_for_booking(booking_id).await.unwrap();
        assert!(!thread[0].is_read); // alice's own message stays untouched
        assert!(thread[1].is_read);
        assert!(thread[2].is_read);

        // Marking again flips nothing new.
        assert_eq!(store.mark_read(booking_id, alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_location_history_is_bounded_and_newest_first() {
        let store = InMemoryLocationStore::new();
        let booking_id = BookingId::new();

        for n in 0..60 {
            store
                .insert(LocationUpdate {
                    id: crate::identifiers::LocationUpdateId::new(),
                    booking_id,
                    latitude: 50.0 + f64::from(n) * 0.001,
                    longitude: 14.4,
                    created_at: Utc::now() + chrono::Duration::milliseconds(i64::from(n)),
                })
                .await
                .unwrap();
        }

        let recent = store.recent_for_booking(booking_id, 50).await.unwrap();
        assert_eq!(recent.len(), 50);
        assert!(recent[0].created_at >= recent[49].created_at);
        assert_eq!(recent[0].latitude, 50.0 + 59.0 * 0.001);
    }
}
