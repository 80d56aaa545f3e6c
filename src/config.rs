//! Engine configuration
//!
//! A single value object constructed at process startup and handed to each
//! component. Nothing in the engine reads the environment or global state.

use serde::{Deserialize, Serialize};

/// Configuration shared by the engine's components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Platform commission rate applied to every booking's total price
    pub commission_rate: f64,
    /// ISO 4217 currency code passed to the payment collaborator
    pub currency: String,
    /// Maximum buffered notifications per recipient before FIFO eviction
    pub notification_capacity: usize,
    /// Maximum location updates returned by a history read
    pub location_history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commission_rate: 0.15,
            currency: "gbp".to_string(),
            notification_capacity: 50,
            location_history_limit: 50,
        }
    }
}
