//! Location tracking during an active tour
//!
//! The guide's device pings positions while a tour is STARTED; the tourist
//! polls them through the notification fan-out. The stream is append-only
//! and read back as bounded recent history.

use crate::booking::BookingStatus;
use crate::booking_service::BookingService;
use crate::errors::{DomainError, DomainResult};
use crate::events::LocationPinged;
use crate::identifiers::{BookingId, LocationUpdateId, UserId};
use crate::notifications::{NotificationHub, NotificationKind};
use crate::persistence::LocationRepository;
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A single position report during a tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocationUpdate {
    /// Unique identifier
    pub id: LocationUpdateId,
    /// The booking whose tour this position belongs to
    pub booking_id: BookingId,
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// When the position was reported
    pub created_at: DateTime<Utc>,
}

/// Check coordinate bounds
pub fn validate_coordinates(latitude: f64, longitude: f64) -> DomainResult<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DomainError::validation(
            "latitude must be between -90 and 90",
        ));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::validation(
            "longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

/// Append-only location stream for active tours
pub struct LocationService {
    bookings: Arc<BookingService>,
    locations: Arc<dyn LocationRepository>,
    notifications: Arc<NotificationHub>,
    history_limit: usize,
}

impl LocationService {
    /// Create the service with its collaborators
    pub fn new(
        bookings: Arc<BookingService>,
        locations: Arc<dyn LocationRepository>,
        notifications: Arc<NotificationHub>,
        history_limit: usize,
    ) -> Self {
        Self {
            bookings,
            locations,
            notifications,
            history_limit,
        }
    }

    /// Record a position for the booking's tour and notify the tourist
    ///
    /// Only the booking's guide may report positions, and only while the
    /// tour is STARTED.
    pub async fn record(
        &self,
        booking_id: BookingId,
        acting_user_id: UserId,
        latitude: f64,
        longitude: f64,
    ) -> DomainResult<LocationUpdate> {
        validate_coordinates(latitude, longitude)?;

        let booking = self.bookings.get(booking_id).await?;
        let participants = self.bookings.participants_of(&booking).await?;
        if acting_user_id != participants.guide_user_id {
            return Err(DomainError::forbidden(
                "only the booking's guide may report locations",
            ));
        }
        if booking.status != BookingStatus::Started {
            return Err(DomainError::InvalidState {
                operation: "record_location",
                required: BookingStatus::Started.name(),
                actual: booking.status.name().to_string(),
            });
        }

        let update = self
            .locations
            .insert(LocationUpdate {
                id: LocationUpdateId::new(),
                booking_id,
                latitude,
                longitude,
                created_at: Utc::now(),
            })
            .await?;

        let event = LocationPinged {
            booking_id,
            latitude,
            longitude,
        };
        self.notifications.publish_event(
            participants.tourist_user_id,
            NotificationKind::Location,
            &event,
        )?;

        debug!(%booking_id, latitude, longitude, "location recorded");
        Ok(update)
    }

    /// The booking's recent positions, newest first, bounded by the
    /// configured history limit
    pub async fn history(&self, booking_id: BookingId) -> DomainResult<Vec<LocationUpdate>> {
        self.bookings.get(booking_id).await?;
        self.locations
            .recent_for_booking(booking_id, self.history_limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(validate_coordinates(0.0, 0.0).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
