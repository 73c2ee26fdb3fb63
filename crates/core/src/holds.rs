//! Hold window and lazy-expiry predicates.

use chrono::Duration;

use crate::status::{HoldStatus, OrderStatus};
use crate::types::Timestamp;

/// Default hold window: ten minutes.
pub const DEFAULT_HOLD_TTL_SECS: i64 = 600;

/// Expiry instant for a hold created at `now`.
pub fn hold_expires_at(now: Timestamp, ttl_secs: i64) -> Timestamp {
    now + Duration::seconds(ttl_secs)
}

/// An ACTIVE hold whose `expires_at` is at or before `now` must be expired
/// by whoever observes it.
pub fn hold_is_lapsed(status: HoldStatus, expires_at: Timestamp, now: Timestamp) -> bool {
    status == HoldStatus::Active && expires_at <= now
}

/// A PENDING_PAYMENT order whose copied `hold_expires_at` has passed can no
/// longer be paid.
pub fn order_is_lapsed(status: OrderStatus, hold_expires_at: Timestamp, now: Timestamp) -> bool {
    status == OrderStatus::PendingPayment && hold_expires_at <= now
}
