// Copyright 2025 Wayfare Labs Ltd.

//! Payment collaborator seam
//!
//! The engine never talks to a gateway directly; it depends on this trait
//! and treats gateway failures as opaque [`DomainError::Payment`] values.
//! Intent creation is keyed by booking id and refunds carry an explicit
//! idempotency key, so caller-side retries are safe.

use crate::errors::{DomainError, DomainResult};
use crate::identifiers::BookingId;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A charge intent opened with the payment collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentIntent {
    /// Gateway-side identifier of the intent
    pub intent_id: String,
    /// Secret the client uses to complete the charge
    pub client_secret: String,
}

/// A refund executed by the payment collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RefundRecord {
    /// Gateway-side identifier of the refund
    pub refund_id: String,
    /// The intent the refund applies to
    pub intent_id: String,
    /// Amount refunded
    pub amount: f64,
}

/// A verified event delivered to the payment webhook endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentWebhookEvent {
    /// The charge for a booking succeeded
    PaymentSucceeded {
        /// The booking the charge belongs to
        booking_id: BookingId,
        /// The intent that was charged
        intent_id: String,
    },
    /// The charge for a booking failed
    PaymentFailed {
        /// The booking the charge belongs to
        booking_id: BookingId,
        /// Gateway-side failure description
        reason: String,
    },
    /// An event kind the engine does not consume
    Unhandled {
        /// The gateway's event type name
        event_type: String,
    },
}

/// External payment collaborator
///
/// Implementations are expected to treat `create_intent` as idempotent per
/// booking id and `refund` as idempotent per `idempotency_key`, so at-least-
/// once callers cannot double-charge or double-refund.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a charge intent for a booking's total price
    async fn create_intent(
        &self,
        booking_id: BookingId,
        amount: f64,
        currency: &str,
    ) -> DomainResult<PaymentIntent>;

    /// Refund part or all of a settled intent
    async fn refund(
        &self,
        intent_id: &str,
        amount: Option<f64>,
        idempotency_key: &str,
    ) -> DomainResult<RefundRecord>;

    /// Verify a webhook delivery's signature and decode its event
    ///
    /// Fails with [`DomainError::Payment`] on a bad signature; callers must
    /// not mutate any state before this succeeds.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> DomainResult<PaymentWebhookEvent>;
}

/// Recording gateway for tests and local runs
///
/// Accepts everything, remembers what it was asked to do, and fabricates
/// references from the booking id. Webhook payloads are JSON of the shape
/// `{"type": "payment_intent.succeeded", "booking_id": "...", "intent_id": "..."}`
/// and any signature other than `"invalid"` verifies.
#[derive(Default)]
pub struct RecordingPaymentGateway {
    intents: RwLock<Vec<(BookingId, f64, String)>>,
    refunds: RwLock<Vec<(String, Option<f64>, String)>>,
}

impl RecordingPaymentGateway {
    /// Create an empty recording gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents opened so far, as `(booking_id, amount, currency)`
    pub fn intents(&self) -> Vec<(BookingId, f64, String)> {
        self.intents.read().unwrap().clone()
    }

    /// Refunds executed so far, as `(intent_id, amount, idempotency_key)`
    pub fn refunds(&self) -> Vec<(String, Option<f64>, String)> {
        self.refunds.read().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingPaymentGateway {
    async fn create_intent(
        &self,
        booking_id: BookingId,
        amount: f64,
        currency: &str,
    ) -> DomainResult<PaymentIntent> {
        self.intents
            .write()
            .unwrap()
            .push((booking_id, amount, currency.to_string()));
        Ok(PaymentIntent {
            intent_id: format!("pi_{booking_id}"),
            client_secret: format!("pi_{booking_id}_secret"),
        })
    }

    async fn refund(
        &self,
        intent_id: &str,
        amount: Option<f64>,
        idempotency_key: &str,
    ) -> DomainResult<RefundRecord> {
        self.refunds.write().unwrap().push((
            intent_id.to_string(),
            amount,
            idempotency_key.to_string(),
        ));
        Ok(RefundRecord {
            refund_id: format!("re_{intent_id}"),
            intent_id: intent_id.to_string(),
            amount: amount.unwrap_or(0.0),
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> DomainResult<PaymentWebhookEvent> {
        if signature == "invalid" {
            return Err(DomainError::Payment("invalid webhook signature".to_string()));
        }

        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| DomainError::Payment(format!("undecodable webhook payload: {e}")))?;

        let event_type = value["type"].as_str().unwrap_or_default().to_string();
        let booking_id = value["booking_id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(BookingId::from_uuid);

        match (event_type.as_str(), booking_id) {
            ("payment_intent.succeeded", Some(booking_id)) => {
                Ok(PaymentWebhookEvent::PaymentSucceeded {
                    booking_id,
                    intent_id: value["intent_id"].as_str().unwrap_or_default().to_string(),
                })
            }
            ("payment_intent.payment_failed", Some(booking_id)) => {
                Ok(PaymentWebhookEvent::PaymentFailed {
                    booking_id,
                    reason: value["reason"].as_str().unwrap_or("declined").to_string(),
                })
            }
            _ => Ok(PaymentWebhookEvent::Unhandled { event_type }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_gateway_remembers_intents() {
        let gateway = RecordingPaymentGateway::new();
        let booking_id = BookingId::new();

        let intent = gateway.create_intent(booking_id, 60.0, "gbp").await.unwrap();
        assert_eq!(intent.intent_id, format!("pi_{booking_id}"));
        assert_eq!(gateway.intents(), vec![(booking_id, 60.0, "gbp".to_string())]);
    }

    #[test]
    fn test_verify_webhook_rejects_bad_signature() {
        let gateway = RecordingPaymentGateway::new();
        let err = gateway.verify_webhook(b"{}", "invalid").unwrap_err();
        assert!(matches!(err, DomainError::Payment(_)));
    }

    #[test]
    fn test_verify_webhook_decodes_success_event() {
        let gateway = RecordingPaymentGateway::new();
        let booking_id = BookingId::new();
        let payload = serde_json::json!({
            "type": "payment_intent.succeeded",
            "booking_id": booking_id.to_string(),
            "intent_id": "pi_123",
        });

        let event = gateway
            .verify_webhook(payload.to_string().as_bytes(), "sig")
            .unwrap();
        assert_eq!(
            event,
            PaymentWebhookEvent::PaymentSucceeded {
                booking_id,
                intent_id: "pi_123".to_string(),
            }
        );
    }

    #[test]
    fn test_verify_webhook_passes_through_unhandled_kinds() {
        let gateway = RecordingPaymentGateway::new();
        let payload = serde_json::json!({"type": "charge.updated"});
        let event = gateway
            .verify_webhook(payload.to_string().as_bytes(), "sig")
            .unwrap();
        assert_eq!(
            event,
            PaymentWebhookEvent::Unhandled {
                event_type: "charge.updated".to_string()
            }
        );
    }
}
