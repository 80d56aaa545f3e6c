// Copyright 2025 Wayfare Labs Ltd.

//! Error types for domain operations

use thiserror::Error;

/// Errors that can occur in domain operations
///
/// Every variant is a recoverable, typed failure meant to be returned to the
/// caller at the boundary. Unexpected conditions (storage unreachable,
/// invariant broken) surface as [`DomainError::Internal`] and should be
/// treated as unrecoverable by callers.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Referenced entity does not exist
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// Type of entity that wasn't found
        entity_type: &'static str,
        /// ID that was searched for
        id: String,
    },

    /// Acting identity lacks the booking-specific relationship the operation requires
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Operation attempted against a booking whose state does not permit it
    #[error("Invalid state: {operation} requires {required}, booking is {actual}")]
    InvalidState {
        /// The operation that was refused
        operation: &'static str,
        /// The state the operation requires
        required: &'static str,
        /// The booking's actual state
        actual: String,
    },

    /// Input outside declared constraints
    #[error("Validation error: {0}")]
    Validation(String),

    /// A review already exists for this booking
    #[error("A review already exists for booking {booking_id}")]
    DuplicateReview {
        /// The booking that is already reviewed
        booking_id: String,
    },

    /// INSTANT booking attempted against an unavailable guide
    #[error("Guide {guide_id} is not available for instant bookings")]
    GuideUnavailable {
        /// The guide that was requested
        guide_id: String,
    },

    /// Error surfaced opaquely from the payment collaborator
    #[error("Payment error: {0}")]
    Payment(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl DomainError {
    /// Stable machine-readable code for this error
    ///
    /// These codes are the boundary contract: controllers map them onto
    /// responses verbatim, so they must never change for an existing variant.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::Forbidden(_) => "FORBIDDEN",
            DomainError::InvalidStateTransition { .. } => "INVALID_TRANSITION",
            DomainError::InvalidState { .. } => "INVALID_STATE",
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::DuplicateReview { .. } => "DUPLICATE_REVIEW",
            DomainError::GuideUnavailable { .. } => "GUIDE_UNAVAILABLE",
            DomainError::Payment(_) => "PAYMENT_ERROR",
            DomainError::Serialization(_) => "INTERNAL_ERROR",
            DomainError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create a not-found error for a booking
    pub fn booking_not_found(id: impl ToString) -> Self {
        DomainError::NotFound {
            entity_type: "Booking",
            id: id.to_string(),
        }
    }

    /// Create a not-found error for a guide
    pub fn guide_not_found(id: impl ToString) -> Self {
        DomainError::NotFound {
            entity_type: "Guide",
            id: id.to_string(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(DomainError::booking_not_found("b-1").code(), "NOT_FOUND");
        assert_eq!(DomainError::forbidden("nope").code(), "FORBIDDEN");
        assert_eq!(
            DomainError::InvalidStateTransition {
                from: "Pending".to_string(),
                to: "Started".to_string(),
            }
            .code(),
            "INVALID_TRANSITION"
        );
        assert_eq!(DomainError::validation("bad").code(), "VALIDATION_ERROR");
        assert_eq!(
            DomainError::DuplicateReview {
                booking_id: "b-1".to_string()
            }
            .code(),
            "DUPLICATE_REVIEW"
        );
        assert_eq!(
            DomainError::GuideUnavailable {
                guide_id: "g-1".to_string()
            }
            .code(),
            "GUIDE_UNAVAILABLE"
        );
        assert_eq!(DomainError::Payment("declined".to_string()).code(), "PAYMENT_ERROR");
    }

    #[test]
    fn test_messages_do_not_leak_internals() {
        let err = DomainError::guide_not_found("7f8d");
        assert_eq!(err.to_string(), "Guide not found: 7f8d");

        let err = DomainError::Payment("intent creation failed".to_string());
        assert_eq!(err.to_string(), "Payment error: intent creation failed");
    }
}
