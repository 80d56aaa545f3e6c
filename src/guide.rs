//! Guide and tourist profile aggregates
//!
//! Only the parts the engine owns: the guide's availability flag gating
//! INSTANT bookings, and the derived rating fields recomputed on review
//! creation. Everything else about profiles lives outside the engine.

use crate::entity::AggregateRoot;
use crate::identifiers::{GuideId, TouristId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guide's profile, as far as the engine is concerned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    /// Unique identifier of the profile
    pub id: GuideId,
    /// The platform user behind this profile
    pub user_id: UserId,
    /// Whether the guide currently accepts INSTANT bookings
    pub is_available: bool,
    /// Arithmetic mean of all review ratings, 0.0 when unreviewed
    pub average_rating: f64,
    /// Number of reviews received
    pub total_reviews: u32,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When the profile was last mutated
    pub updated_at: DateTime<Utc>,
    version: u64,
}

impl Guide {
    /// Create a fresh, unreviewed guide profile
    pub fn new(user_id: UserId, is_available: bool) -> Self {
        let now = Utc::now();
        Self {
            id: GuideId::new(),
            user_id,
            is_available,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

impl AggregateRoot for Guide {
    type Id = GuideId;

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

/// A tourist's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tourist {
    /// Unique identifier of the profile
    pub id: TouristId,
    /// The platform user behind this profile
    pub user_id: UserId,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

impl Tourist {
    /// Create a tourist profile for a user
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: TouristId::new(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
