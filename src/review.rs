// Copyright 2025 Wayfare Labs Ltd.

//! Reviews and guide ratings
//!
//! A completed booking can be reviewed exactly once, by its tourist. Review
//! creation is the only thing that mutates a guide's rating fields, and it
//! recomputes them from the full review set rather than maintaining a
//! running average that could drift.

use crate::booking::BookingStatus;
use crate::booking_service::BookingService;
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::{BookingId, GuideId, ReviewId, TouristId};
use crate::persistence::{GuideRepository, ReviewRepository};
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Lowest permitted rating
pub const MIN_RATING: u8 = 1;

/// Highest permitted rating
pub const MAX_RATING: u8 = 5;

/// Maximum review comment length in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

/// A tourist's review of a completed booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Review {
    /// Unique identifier
    pub id: ReviewId,
    /// The reviewed booking (unique across all reviews)
    pub booking_id: BookingId,
    /// The reviewing tourist, denormalized from the booking
    pub tourist_id: TouristId,
    /// The reviewed guide, denormalized from the booking
    pub guide_id: GuideId,
    /// Rating from 1 to 5
    pub rating: u8,
    /// Optional free-text comment
    pub comment: Option<String>,
    /// When the review was created (reviews are immutable)
    pub created_at: DateTime<Utc>,
}

/// One review per completed booking, plus guide rating recomputation
pub struct ReviewService {
    bookings: Arc<BookingService>,
    reviews: Arc<dyn ReviewRepository>,
    guides: Arc<dyn GuideRepository>,
}

impl ReviewService {
    /// Create the service with its collaborators
    pub fn new(
        bookings: Arc<BookingService>,
        reviews: Arc<dyn ReviewRepository>,
        guides: Arc<dyn GuideRepository>,
    ) -> Self {
        Self {
            bookings,
            reviews,
            guides,
        }
    }

    /// Create the booking's one review and recompute the guide's rating
    pub async fn create_review(
        &self,
        booking_id: BookingId,
        tourist_id: TouristId,
        rating: u8,
        comment: Option<String>,
    ) -> DomainResult<Review> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(DomainError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        if let Some(ref comment) = comment {
            if comment.chars().count() > MAX_COMMENT_CHARS {
                return Err(DomainError::validation(format!(
                    "comment must be at most {MAX_COMMENT_CHARS} characters"
                )));
            }
        }

        let booking = self.bookings.get(booking_id).await?;
        if booking.status != BookingStatus::Completed {
            return Err(DomainError::InvalidState {
                operation: "create_review",
                required: BookingStatus::Completed.name(),
                actual: booking.status.name().to_string(),
            });
        }
        if booking.tourist_id != tourist_id {
            return Err(DomainError::forbidden(
                "only the booking's tourist may review it",
            ));
        }

        // Uniqueness on booking_id is enforced by the store; a concurrent
        // duplicate comes back as DuplicateReview from exactly one of the
        // two inserts.
        let review = self
            .reviews
            .insert(Review {
                id: ReviewId::new(),
                booking_id,
                tourist_id,
                guide_id: booking.guide_id,
                rating,
                comment,
                created_at: Utc::now(),
            })
            .await?;

        self.recompute_guide_rating(booking.guide_id).await?;

        info!(%booking_id, guide_id = %booking.guide_id, rating, "review created");
        Ok(review)
    }

    /// One page of a guide's reviews, newest first; `page` starts at 1
    pub async fn list_for_guide(
        &self,
        guide_id: GuideId,
        page: u32,
        limit: u32,
    ) -> DomainResult<Vec<Review>> {
        if page == 0 {
            return Err(DomainError::validation("page numbers start at 1"));
        }
        if limit == 0 {
            return Err(DomainError::validation("page limit must be positive"));
        }
        self.reviews.list_for_guide(guide_id, page, limit).await
    }

    /// The booking's review, if it has one
    pub async fn get_for_booking(&self, booking_id: BookingId) -> DomainResult<Option<Review>> {
        self.reviews.find_for_booking(booking_id).await
    }

    /// Recompute the guide's rating fields from every review on record
    async fn recompute_guide_rating(&self, guide_id: GuideId) -> DomainResult<()> {
        let all = self.reviews.list_all_for_guide(guide_id).await?;
        let total = all.len() as u32;
        let average = if total > 0 {
            all.iter().map(|r| f64::from(r.rating)).sum::<f64>() / f64::from(total)
        } else {
            0.0
        };
        self.guides.update_rating(guide_id, average, total).await?;
        Ok(())
    }
}
