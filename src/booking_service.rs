// Copyright 2025 Wayfare Labs Ltd.

//! Booking lifecycle operations
//!
//! [`BookingService`] owns every transition of the booking state machine.
//! Each operation embeds its own authorization check, because legality
//! depends jointly on the acting identity and the specific booking: "is this
//! the assigned guide for *this* booking", never mere role membership.

use crate::booking::{Booking, BookingStatus, BookingType, NewBooking};
use crate::config::EngineConfig;
use crate::errors::{DomainError, DomainResult};
use crate::events::{
    BookingCancelled, BookingConfirmed, BookingCreated, TourCompleted, TourStarted,
};
use crate::identifiers::{BookingId, GuideId, Role, TouristId, UserId};
use crate::notifications::{NotificationHub, NotificationKind};
use crate::payments::{PaymentGateway, PaymentIntent, PaymentWebhookEvent, RefundRecord};
use crate::persistence::{
    BookingRepository, GuideRepository, TouristRepository, TransitionChange,
};
use crate::policy;
use crate::state_machine::State;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The two parties attached to a booking, resolved to platform users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingParticipants {
    /// The booking's tourist profile
    pub tourist_id: TouristId,
    /// The booking's guide profile
    pub guide_id: GuideId,
    /// The platform user behind the tourist profile
    pub tourist_user_id: UserId,
    /// The platform user behind the guide profile
    pub guide_user_id: UserId,
}

impl BookingParticipants {
    /// Whether this user is one of the two participants
    pub fn includes(&self, user_id: UserId) -> bool {
        user_id == self.tourist_user_id || user_id == self.guide_user_id
    }

    /// The other participant's user id, or `None` if `user_id` is not a
    /// participant at all
    pub fn counterpart(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.tourist_user_id {
            Some(self.guide_user_id)
        } else if user_id == self.guide_user_id {
            Some(self.tourist_user_id)
        } else {
            None
        }
    }
}

/// Result of creating a booking: the PENDING booking and the open charge intent
#[derive(Debug, Clone)]
pub struct CreatedBooking {
    /// The persisted booking, in PENDING
    pub booking: Booking,
    /// The charge intent the client completes; confirmation arrives later
    /// through the payment webhook, not through this value
    pub payment: PaymentIntent,
}

/// Result of cancelling a booking
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    /// The booking, now CANCELLED
    pub booking: Booking,
    /// Refund tier applied, as a fraction of the total price
    pub refund_percentage: f64,
    /// Amount refunded
    pub refund_amount: f64,
    /// The gateway's refund record, when a refund was actually executed
    pub refund: Option<RefundRecord>,
}

/// The booking state machine and its lifecycle operations
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    guides: Arc<dyn GuideRepository>,
    tourists: Arc<dyn TouristRepository>,
    payments: Arc<dyn PaymentGateway>,
    notifications: Arc<NotificationHub>,
    config: EngineConfig,
}

impl BookingService {
    /// Create the service with its collaborators
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        guides: Arc<dyn GuideRepository>,
        tourists: Arc<dyn TouristRepository>,
        payments: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationHub>,
        config: EngineConfig,
    ) -> Self {
        Self {
            bookings,
            guides,
            tourists,
            payments,
            notifications,
            config,
        }
    }

    /// Create a PENDING booking and open a charge intent for it
    ///
    /// INSTANT bookings require the guide to be available. The computed
    /// commission split is persisted with the booking; the returned intent is
    /// handed to the client, and the booking stays PENDING until the payment
    /// webhook confirms the charge.
    pub async fn create_booking(&self, input: NewBooking) -> DomainResult<CreatedBooking> {
        input.validate()?;

        let guide = self
            .guides
            .find(input.guide_id)
            .await?
            .ok_or_else(|| DomainError::guide_not_found(input.guide_id))?;
        if input.booking_type == BookingType::Instant && !guide.is_available {
            return Err(DomainError::GuideUnavailable {
                guide_id: guide.id.to_string(),
            });
        }

        let tourist = self
            .tourists
            .find(input.tourist_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "Tourist",
                id: input.tourist_id.to_string(),
            })?;

        let split = policy::split_commission(input.total_price, self.config.commission_rate);
        let booking = self.bookings.insert(Booking::create(input, split)?).await?;

        let event = BookingCreated {
            booking_id: booking.id,
            tourist_id: booking.tourist_id,
            guide_id: booking.guide_id,
            status: booking.status,
            total_price: booking.total_price,
        };
        self.notifications
            .publish_event(tourist.user_id, NotificationKind::Booking, &event)?;
        self.notifications
            .publish_event(guide.user_id, NotificationKind::Booking, &event)?;

        // Intent creation is keyed by booking id on the gateway side, so a
        // retried call cannot open a second charge.
        let payment = self
            .payments
            .create_intent(booking.id, booking.total_price, &self.config.currency)
            .await?;

        info!(
            booking_id = %booking.id,
            total_price = booking.total_price,
            commission = booking.commission,
            "booking created"
        );
        Ok(CreatedBooking { booking, payment })
    }

    /// Confirm a booking's payment, transitioning PENDING to CONFIRMED
    ///
    /// Called from the payment webhook path after signature verification.
    /// Idempotent: confirming an already-CONFIRMED booking is a no-op that
    /// neither re-notifies nor overwrites the stored payment reference.
    pub async fn confirm_payment(
        &self,
        booking_id: BookingId,
        payment_intent_id: &str,
    ) -> DomainResult<Booking> {
        let booking = self.get(booking_id).await?;
        if booking.status == BookingStatus::Confirmed {
            debug!(%booking_id, "payment already confirmed, webhook redelivery ignored");
            return Ok(booking);
        }

        let change = TransitionChange::to(BookingStatus::Confirmed)
            .with_payment_intent_id(payment_intent_id);
        let confirmed = match self.bookings.transition(booking_id, change).await {
            Ok(confirmed) => confirmed,
            // Lost a race against a concurrent redelivery; the other call
            // already confirmed and notified.
            Err(DomainError::InvalidStateTransition { ref from, .. })
                if from == BookingStatus::Confirmed.name() =>
            {
                return self.get(booking_id).await;
            }
            Err(err) => return Err(err),
        };

        let participants = self.participants_of(&confirmed).await?;
        let event = BookingConfirmed {
            booking_id,
            payment_intent_id: payment_intent_id.to_string(),
        };
        self.notifications.publish_event(
            participants.tourist_user_id,
            NotificationKind::Booking,
            &event,
        )?;
        self.notifications.publish_event(
            participants.guide_user_id,
            NotificationKind::Booking,
            &event,
        )?;

        info!(%booking_id, "payment confirmed");
        Ok(confirmed)
    }

    /// Start the tour, transitioning CONFIRMED to STARTED
    pub async fn start_tour(
        &self,
        booking_id: BookingId,
        acting_user_id: UserId,
    ) -> DomainResult<Booking> {
        let booking = self.get(booking_id).await?;
        let participants = self.participants_of(&booking).await?;
        if acting_user_id != participants.guide_user_id {
            return Err(DomainError::forbidden(
                "only the assigned guide may start the tour",
            ));
        }

        let start_time = Utc::now();
        let change = TransitionChange::to(BookingStatus::Started).with_start_time(start_time);
        let started = self.bookings.transition(booking_id, change).await?;

        let event = TourStarted {
            booking_id,
            start_time,
        };
        self.notifications.publish_event(
            participants.tourist_user_id,
            NotificationKind::Booking,
            &event,
        )?;

        info!(%booking_id, "tour started");
        Ok(started)
    }

    /// Complete the tour, transitioning STARTED to COMPLETED
    pub async fn complete_tour(
        &self,
        booking_id: BookingId,
        acting_user_id: UserId,
    ) -> DomainResult<Booking> {
        let booking = self.get(booking_id).await?;
        let participants = self.participants_of(&booking).await?;
        if acting_user_id != participants.guide_user_id {
            return Err(DomainError::forbidden(
                "only the assigned guide may complete the tour",
            ));
        }

        let end_time = Utc::now();
        let change = TransitionChange::to(BookingStatus::Completed).with_end_time(end_time);
        let completed = self.bookings.transition(booking_id, change).await?;

        let event = TourCompleted {
            booking_id,
            end_time,
        };
        self.notifications.publish_event(
            participants.tourist_user_id,
            NotificationKind::Booking,
            &event,
        )?;

        info!(%booking_id, "tour completed");
        Ok(completed)
    }

    /// Cancel the booking, refunding by lead time
    ///
    /// Either participant may cancel while the booking is not terminal. The
    /// refund tier is computed from the booking's scheduled date against the
    /// current time; a booking with no scheduled date refunds nothing. The
    /// refund percentage is included in the notification payload.
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        acting_user_id: UserId,
    ) -> DomainResult<CancellationOutcome> {
        let booking = self.get(booking_id).await?;
        let participants = self.participants_of(&booking).await?;
        if !participants.includes(acting_user_id) {
            return Err(DomainError::forbidden(
                "only booking participants may cancel",
            ));
        }

        let refund_percentage = policy::refund_tier(booking.scheduled_date, Utc::now());
        let refund_amount = policy::refund_amount(booking.total_price, refund_percentage);

        let cancelled = self
            .bookings
            .transition(booking_id, TransitionChange::to(BookingStatus::Cancelled))
            .await?;

        let refund = match cancelled.payment_intent_id.as_deref() {
            Some(intent_id) if refund_amount > 0.0 => {
                let idempotency_key = format!("{booking_id}:cancel");
                let record = self
                    .payments
                    .refund(intent_id, Some(refund_amount), &idempotency_key)
                    .await?;
                info!(%booking_id, refund_amount, "refund instructed");
                Some(record)
            }
            _ => None,
        };

        let event = BookingCancelled {
            booking_id,
            refund_percentage,
            refund_amount,
        };
        self.notifications.publish_event(
            participants.tourist_user_id,
            NotificationKind::Booking,
            &event,
        )?;
        self.notifications.publish_event(
            participants.guide_user_id,
            NotificationKind::Booking,
            &event,
        )?;

        info!(%booking_id, refund_percentage, "booking cancelled");
        Ok(CancellationOutcome {
            booking: cancelled,
            refund_percentage,
            refund_amount,
            refund,
        })
    }

    /// Handle a delivery on the payment webhook endpoint
    ///
    /// Verifies the signature through the gateway before touching anything;
    /// a bad signature fails with `Payment` and mutates no booking. Returns
    /// the confirmed booking for success events, `None` for event kinds the
    /// engine does not consume.
    pub async fn handle_payment_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> DomainResult<Option<Booking>> {
        let event = match self.payments.verify_webhook(payload, signature) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "webhook rejected");
                return Err(err);
            }
        };

        match event {
            PaymentWebhookEvent::PaymentSucceeded {
                booking_id,
                intent_id,
            } => self
                .confirm_payment(booking_id, &intent_id)
                .await
                .map(Some),
            PaymentWebhookEvent::PaymentFailed { booking_id, reason } => {
                warn!(%booking_id, reason = %reason, "payment failed, booking stays pending");
                Ok(None)
            }
            PaymentWebhookEvent::Unhandled { event_type } => {
                debug!(event_type = %event_type, "ignoring webhook event kind");
                Ok(None)
            }
        }
    }

    /// Load a booking by id
    pub async fn get(&self, booking_id: BookingId) -> DomainResult<Booking> {
        self.bookings
            .find(booking_id)
            .await?
            .ok_or_else(|| DomainError::booking_not_found(booking_id))
    }

    /// A user's bookings, selected by which side of the relationship the
    /// role puts them on; ADMIN sees both sides
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        role: Role,
    ) -> DomainResult<Vec<Booking>> {
        let mut bookings = match role {
            Role::Tourist => self.tourist_side(user_id).await?,
            Role::Guide => self.guide_side(user_id).await?,
            Role::Admin => {
                let mut all = self.tourist_side(user_id).await?;
                all.extend(self.guide_side(user_id).await?);
                all
            }
        };
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    /// Resolve the booking's two participants to platform users
    pub async fn participants(&self, booking_id: BookingId) -> DomainResult<BookingParticipants> {
        let booking = self.get(booking_id).await?;
        self.participants_of(&booking).await
    }

    /// Resolve an already-loaded booking's participants
    pub async fn participants_of(&self, booking: &Booking) -> DomainResult<BookingParticipants> {
        let guide = self
            .guides
            .find(booking.guide_id)
            .await?
            .ok_or_else(|| DomainError::internal("booking references an unknown guide"))?;
        let tourist = self
            .tourists
            .find(booking.tourist_id)
            .await?
            .ok_or_else(|| DomainError::internal("booking references an unknown tourist"))?;
        Ok(BookingParticipants {
            tourist_id: tourist.id,
            guide_id: guide.id,
            tourist_user_id: tourist.user_id,
            guide_user_id: guide.user_id,
        })
    }

    async fn tourist_side(&self, user_id: UserId) -> DomainResult<Vec<Booking>> {
        match self.tourists.find_by_user(user_id).await? {
            Some(tourist) => self.bookings.list_for_tourist(tourist.id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn guide_side(&self, user_id: UserId) -> DomainResult<Vec<Booking>> {
        match self.guides.find_by_user(user_id).await? {
            Some(guide) => self.bookings.list_for_guide(guide.id).await,
            None => Ok(Vec::new()),
        }
    }
}
