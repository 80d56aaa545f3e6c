// Copyright 2025 Wayfare Labs Ltd.

//! Commission and refund policy
//!
//! Pure functions, no I/O. Monetary values are `f64` rounded half-up to two
//! decimal places; the guide's earnings are computed as the remainder after
//! rounding the commission, so `commission + guide_earnings` always equals
//! the total exactly at two decimals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default platform commission rate
pub const DEFAULT_COMMISSION_RATE: f64 = 0.15;

/// Round a monetary value half-up to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The two-way split of a booking's total price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSplit {
    /// The platform's cut
    pub commission: f64,
    /// The remainder owed to the guide
    pub guide_earnings: f64,
}

/// Split a total price into platform commission and guide earnings
///
/// The commission is rounded independently; earnings are the exact remainder,
/// which keeps the sum invariant without a second rounding step.
pub fn split_commission(total_price: f64, rate: f64) -> CommissionSplit {
    let commission = round2(total_price * rate);
    let guide_earnings = round2(total_price - commission);
    CommissionSplit {
        commission,
        guide_earnings,
    }
}

/// Refund percentage for a cancellation at `now`
///
/// Tiers step down by whole hours of lead time before the scheduled date.
/// A booking with no scheduled date (INSTANT) has no policy window and
/// refunds nothing.
pub fn refund_tier(scheduled_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(scheduled) = scheduled_date else {
        return 0.0;
    };

    let hours_until = (scheduled - now).num_hours();
    if hours_until >= 24 {
        1.0
    } else if hours_until >= 12 {
        0.5
    } else if hours_until >= 2 {
        0.25
    } else {
        0.0
    }
}

/// Amount refunded for a cancellation, rounded to two decimals
pub fn refund_amount(total_price: f64, refund_percentage: f64) -> f64 {
    round2(total_price * refund_percentage)
}
