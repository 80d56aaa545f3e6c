// Copyright 2025 Wayfare Labs Ltd.

//! Marker types, typed ID aliases, and the closed role set

use crate::entity::EntityId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Marker type for platform users (the identity collaborator's subjects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserMarker;

/// Marker type for bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookingMarker;

/// Marker type for guide profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuideMarker;

/// Marker type for tourist profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouristMarker;

/// Marker type for tours (a guide's published offering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TourMarker;

/// Marker type for messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageMarker;

/// Marker type for reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewMarker;

/// Marker type for location updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationMarker;

/// ID of a platform user
pub type UserId = EntityId<UserMarker>;

/// ID of a booking
pub type BookingId = EntityId<BookingMarker>;

/// ID of a guide profile
pub type GuideId = EntityId<GuideMarker>;

/// ID of a tourist profile
pub type TouristId = EntityId<TouristMarker>;

/// ID of a tour offering
pub type TourId = EntityId<TourMarker>;

/// ID of a message
pub type MessageId = EntityId<MessageMarker>;

/// ID of a review
pub type ReviewId = EntityId<ReviewMarker>;

/// ID of a location update
pub type LocationUpdateId = EntityId<LocationMarker>;

/// The closed set of platform roles
///
/// Role is supplied by the identity collaborator alongside the acting user
/// id. Authorization inside the engine is always booking-specific (is this
/// the assigned guide/tourist), never role-wide; the role only selects which
/// side of a relationship a read applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// A traveller booking tours
    Tourist,
    /// A guide offering tours
    Guide,
    /// Platform operations staff
    Admin,
}

impl Role {
    /// Name of this role as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tourist => "TOURIST",
            Role::Guide => "GUIDE",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Tourist.as_str(), "TOURIST");
        assert_eq!(Role::Guide.as_str(), "GUIDE");
        assert_eq!(Role::Admin.as_str(), "ADMIN");
    }

    #[test]
    fn test_role_serde_roundtrip() {
        let json = serde_json::to_string(&Role::Guide).unwrap();
        assert_eq!(json, "\"GUIDE\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::Guide);
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Compile-time property: mixing these up does not build.
        let booking_id = BookingId::new();
        let guide_id = GuideId::new();
        assert_ne!(booking_id.to_string(), guide_id.to_string());
    }
}
