//! Checkout use cases.
//!
//! Each public function is one operation of the purchase flow. It owns its
//! transaction boundary: the isolation level is chosen per operation and the
//! transaction is committed only once every conditional update has moved
//! the expected number of rows. Dropping a [`sqlx::Transaction`] without
//! committing rolls it back, so an early `return Err(..)` never leaves a
//! partial write behind.

pub mod checkin;
pub mod expiry;
pub mod holds;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod tickets;

/// Result of an idempotent create.
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub value: T,
    /// `true` when a previous identical request produced `value`.
    pub replayed: bool,
}

impl<T> Created<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            replayed: false,
        }
    }

    pub fn replayed(value: T) -> Self {
        Self {
            value,
            replayed: true,
        }
    }
}
