//! Order money arithmetic and commercial policy defaults.
//!
//! Fees are computed exactly once, when the order is created, from the
//! policy active for the tenant at that instant:
//!
//! `fee = round(subtotal * bps / 10000) + fixed`, `total = subtotal + fee`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Cents;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: i64 = 10_000;

/// Platform default percentage fee applied when a tenant has no policy yet.
pub const DEFAULT_SERVICE_FEE_BPS: i32 = 1_000;

/// Platform default fixed fee in cents.
pub const DEFAULT_SERVICE_FEE_FIXED_CENTS: Cents = 200;

/// Version tag stored on orders priced with the platform default.
pub const DEFAULT_POLICY_VERSION: &str = "platform-default-v1";

/// The fee schedule applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    pub service_fee_percent_bps: i32,
    pub service_fee_fixed_cents: Cents,
    pub version: String,
}

impl FeePolicy {
    pub fn platform_default() -> Self {
        Self {
            service_fee_percent_bps: DEFAULT_SERVICE_FEE_BPS,
            service_fee_fixed_cents: DEFAULT_SERVICE_FEE_FIXED_CENTS,
            version: DEFAULT_POLICY_VERSION.to_string(),
        }
    }
}

/// Computed money fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub ticket_subtotal_cents: Cents,
    pub service_fee_cents: Cents,
    pub total_amount_cents: Cents,
}

/// Round `subtotal * bps / 10000` half away from zero, in integer arithmetic.
pub fn percentage_fee(subtotal: Cents, bps: i32) -> Result<Cents, CoreError> {
    let scaled = i128::from(subtotal) * i128::from(bps);
    let denom = i128::from(BPS_DENOMINATOR);
    let half = denom / 2;
    let rounded = if scaled >= 0 {
        (scaled + half) / denom
    } else {
        (scaled - half) / denom
    };
    Cents::try_from(rounded).map_err(|_| CoreError::validation("service fee overflows"))
}

/// Price an order from its per-seat unit prices.
pub fn compute_totals(unit_prices: &[Cents], policy: &FeePolicy) -> Result<OrderTotals, CoreError> {
    if policy.service_fee_percent_bps < 0 || policy.service_fee_fixed_cents < 0 {
        return Err(CoreError::Internal(format!(
            "commercial policy {} has a negative fee",
            policy.version
        )));
    }
    if unit_prices.iter().any(|p| *p < 0) {
        return Err(CoreError::Internal("seat price must not be negative".into()));
    }

    let subtotal = unit_prices
        .iter()
        .try_fold(0i64, |acc, p| acc.checked_add(*p))
        .ok_or_else(|| CoreError::validation("order subtotal overflows"))?;

    let fee = percentage_fee(subtotal, policy.service_fee_percent_bps)?
        .checked_add(policy.service_fee_fixed_cents)
        .ok_or_else(|| CoreError::validation("service fee overflows"))?;

    let total = subtotal
        .checked_add(fee)
        .ok_or_else(|| CoreError::validation("order total overflows"))?;

    Ok(OrderTotals {
        ticket_subtotal_cents: subtotal,
        service_fee_cents: fee,
        total_amount_cents: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(bps: i32, fixed: Cents) -> FeePolicy {
        FeePolicy {
            service_fee_percent_bps: bps,
            service_fee_fixed_cents: fixed,
            version: "test".into(),
        }
    }

    #[test]
    fn two_seats_at_fifty_with_ten_percent_plus_two() {
        let totals = compute_totals(&[5000, 5000], &policy(1000, 200)).unwrap();
        assert_eq!(totals.ticket_subtotal_cents, 10_000);
        assert_eq!(totals.service_fee_cents, 1_200);
        assert_eq!(totals.total_amount_cents, 11_200);
    }

    #[test]
    fn rounds_half_up() {
        // 1005 * 0.10 = 100.5 -> 101
        assert_eq!(percentage_fee(1005, 1000).unwrap(), 101);
        // 1004 * 0.10 = 100.4 -> 100
        assert_eq!(percentage_fee(1004, 1000).unwrap(), 100);
        // 333 * 0.0150 = 4.995 -> 5
        assert_eq!(percentage_fee(333, 150).unwrap(), 5);
    }

    #[test]
    fn zero_policy_charges_no_fee() {
        let totals = compute_totals(&[1234], &policy(0, 0)).unwrap();
        assert_eq!(totals.service_fee_cents, 0);
        assert_eq!(totals.total_amount_cents, 1234);
    }

    #[test]
    fn fixed_fee_applies_once_per_order() {
        let totals = compute_totals(&[100, 100, 100], &policy(0, 250)).unwrap();
        assert_eq!(totals.service_fee_cents, 250);
        assert_eq!(totals.total_amount_cents, 550);
    }

    #[test]
    fn subtotal_is_sum_of_unit_prices() {
        let totals = compute_totals(&[1500, 2500, 4000], &policy(500, 0)).unwrap();
        assert_eq!(totals.ticket_subtotal_cents, 8000);
        assert_eq!(totals.service_fee_cents, 400);
    }

    #[test]
    fn negative_policy_is_rejected() {
        assert!(compute_totals(&[100], &policy(-1, 0)).is_err());
    }

    #[test]
    fn overflow_is_reported() {
        assert!(compute_totals(&[Cents::MAX, 1], &policy(0, 0)).is_err());
    }

    #[test]
    fn platform_default_values() {
        let p = FeePolicy::platform_default();
        assert_eq!(p.service_fee_percent_bps, 1000);
        assert_eq!(p.service_fee_fixed_cents, 200);
        assert_eq!(p.version, DEFAULT_POLICY_VERSION);
    }
}
