//! State machine primitives for domain aggregates
//!
//! Aggregates whose lifecycle is a closed set of states implement
//! [`StateTransitions`] to declare which moves are legal. Services and
//! repositories call [`guard_transition`] so that an illegal move is refused
//! the same way everywhere, and record the returned [`StateTransition`]
//! when they need an audit trail.

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Declares the legal transitions out of each state
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;
}

/// Record of a state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Validate a transition, producing a record of it on success
///
/// Terminal states refuse every move; non-terminal states refuse moves not
/// declared by [`StateTransitions::can_transition_to`].
pub fn guard_transition<S: StateTransitions>(from: &S, to: &S) -> DomainResult<StateTransition<S>> {
    if from.is_terminal() || !from.can_transition_to(to) {
        return Err(DomainError::InvalidStateTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    }

    Ok(StateTransition {
        from: from.clone(),
        to: to.clone(),
        transition_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    })
}
