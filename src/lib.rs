//! # Wayfare Domain
//!
//! Booking lifecycle, commission, and review domain for the Wayfare
//! tour-guide marketplace.
//!
//! This crate is the marketplace's engine room — everything with real
//! state-machine logic, policy computation, or multi-party consistency
//! concerns lives here, behind typed seams:
//!
//! - **Booking state machine**: creation, payment confirmation, tour
//!   start/completion, and cancellation, with per-booking serialized
//!   transitions
//! - **Policy**: pure commission-split and time-tiered refund computation
//! - **Notification fan-out**: bounded per-recipient event buffers polled by
//!   clients without a persistent connection
//! - **Messaging**: per-booking threads restricted to the two participants
//! - **Reviews**: one review per completed booking, with full recomputation
//!   of the guide's aggregate rating
//! - **Location tracking**: append-only position stream during active tours
//!
//! ## Design principles
//!
//! 1. **Typed identity**: phantom-typed IDs so a booking id can never stand
//!    in for a guide id
//! 2. **Relationship-scoped authorization**: every check asks "is this the
//!    assigned guide/tourist for this booking", never mere role membership
//! 3. **Injected collaborators**: payment gateway and persistence are trait
//!    seams handed in at construction; no global state
//! 4. **Typed failures**: every recoverable error is a [`DomainError`] with
//!    a stable machine-readable code
//! 5. **Controlled state**: booking statuses are a closed enum and every
//!    transition passes the same guard

#![warn(missing_docs)]

mod booking;
mod booking_service;
mod config;
mod entity;
mod errors;
mod events;
mod guide;
mod identifiers;
mod location;
mod messaging;
mod notifications;
mod payments;
pub mod persistence;
pub mod policy;
mod review;
mod state_machine;

// Re-export core types
pub use booking::{
    Booking, BookingStatus, BookingType, NewBooking, MIN_DURATION_MINUTES,
    MIN_MEETING_POINT_CHARS,
};
pub use booking_service::{
    BookingParticipants, BookingService, CancellationOutcome, CreatedBooking,
};
pub use config::EngineConfig;
pub use entity::{AggregateRoot, EntityId};
pub use errors::{DomainError, DomainResult};
pub use events::{
    BookingCancelled, BookingConfirmed, BookingCreated, DomainEvent, LocationPinged, MessageSent,
    TourCompleted, TourStarted,
};
pub use guide::{Guide, Tourist};
pub use identifiers::{
    BookingId, GuideId, LocationUpdateId, MessageId, ReviewId, Role, TourId, TouristId, UserId,
};
pub use location::{validate_coordinates, LocationService, LocationUpdate};
pub use messaging::{validate_content, Message, MessagingService, MAX_MESSAGE_CHARS};
pub use notifications::{Notification, NotificationHub, NotificationKind};
pub use payments::{
    PaymentGateway, PaymentIntent, PaymentWebhookEvent, RecordingPaymentGateway, RefundRecord,
};
pub use review::{Review, ReviewService, MAX_COMMENT_CHARS, MAX_RATING, MIN_RATING};
pub use state_machine::{guard_transition, State, StateTransition, StateTransitions};

// Re-export common marker types
pub mod markers {
    //! Marker types for phantom type parameters
    pub use crate::identifiers::{
        BookingMarker, GuideMarker, LocationMarker, MessageMarker, ReviewMarker, TourMarker,
        TouristMarker, UserMarker,
    };
}
