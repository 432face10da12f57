//! Coupon installment rules.
//!
//! | type             | qualifying installments                                  |
//! |------------------|----------------------------------------------------------|
//! | `None`           | breached observations                                    |
//! | `Fixed`/`Phoenix`| observations that did not breach                         |
//! | `PhoenixMemory`  | position of the last non-breached observation (recall)   |
//! | `Vanilla`        | position of the last observation if it did not breach    |
//!
//! The count is capped at the coupon's installments.

use note_core::codec::{Coupon, CouponType};
use note_core::types::{PERCENT_SCALE, UNIT};

use crate::breach::Observation;
use crate::error::{Result, SettlementError};

/// Installment dates of an unconditional coupon:
/// `creation + period * k / installments` for `k = 1..=installments`.
///
/// # Examples
/// ```
/// use note_settlement::payout::installment_times;
///
/// assert_eq!(installment_times(0, 360, 4), vec![90, 180, 270, 360]);
/// assert!(installment_times(0, 360, 0).is_empty());
/// ```
pub fn installment_times(creation: u64, period: u64, installments: u16) -> Vec<u64> {
    let n = u128::from(installments);
    (1..=n)
        .map(|k| {
            let offset = u128::from(period) * k / n;
            creation.saturating_add(u64::try_from(offset).unwrap_or(u64::MAX))
        })
        .collect()
}

/// Number of installments a coupon pays for the given observations.
pub fn qualifying_installments(
    coupon_type: CouponType,
    observations: &[Observation],
    installments: u16,
) -> u64 {
    let count = match coupon_type {
        CouponType::None => observations.iter().filter(|o| o.breached).count(),
        CouponType::Fixed | CouponType::Phoenix => {
            observations.iter().filter(|o| !o.breached).count()
        }
        CouponType::PhoenixMemory => observations
            .iter()
            .rposition(|o| !o.breached)
            .map_or(0, |i| i + 1),
        CouponType::Vanilla => match observations.last() {
            Some(last) if !last.breached => observations.len(),
            _ => 0,
        },
    };
    (count as u64).min(u64::from(installments))
}

/// Coupon amount at `UNIT_DECIMALS`.
///
/// `per_installment = coupon_pct * initial_spot / 10_000 / installments`, then
/// `count * per_installment * settlement_amount / UNIT`.
pub fn coupon_amount(
    coupon: &Coupon,
    count: u64,
    initial_spot: u128,
    settlement_amount: u128,
) -> Result<u128> {
    if count == 0 || coupon.installments == 0 {
        return Ok(0);
    }
    let overflow = || SettlementError::Overflow("coupon amount");
    let per_installment = u128::from(coupon.coupon_pct)
        .checked_mul(initial_spot)
        .ok_or_else(overflow)?
        / PERCENT_SCALE
        / u128::from(coupon.installments);
    let amount = u128::from(count)
        .checked_mul(per_installment)
        .and_then(|v| v.checked_mul(settlement_amount))
        .ok_or_else(overflow)?
        / UNIT;
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pattern: &[bool]) -> Vec<Observation> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, breached)| Observation {
                timestamp: (i as u64 + 1) * 100,
                breached: *breached,
            })
            .collect()
    }

    #[test]
    fn test_counts_by_type() {
        // breach pattern: miss, pay, miss, pay, miss
        let observations = obs(&[true, false, true, false, true]);
        assert_eq!(qualifying_installments(CouponType::None, &observations, 12), 3);
        assert_eq!(qualifying_installments(CouponType::Fixed, &observations, 12), 2);
        assert_eq!(qualifying_installments(CouponType::Phoenix, &observations, 12), 2);
        assert_eq!(
            qualifying_installments(CouponType::PhoenixMemory, &observations, 12),
            4
        );
        assert_eq!(qualifying_installments(CouponType::Vanilla, &observations, 12), 0);
    }

    #[test]
    fn test_vanilla_last_observation() {
        let observations = obs(&[true, true, false]);
        assert_eq!(qualifying_installments(CouponType::Vanilla, &observations, 12), 3);
        assert_eq!(qualifying_installments(CouponType::Vanilla, &[], 12), 0);
    }

    #[test]
    fn test_memory_recalls_missed() {
        let observations = obs(&[true, true, true, false]);
        assert_eq!(
            qualifying_installments(CouponType::PhoenixMemory, &observations, 12),
            4
        );
        let never = obs(&[true, true]);
        assert_eq!(qualifying_installments(CouponType::PhoenixMemory, &never, 12), 0);
    }

    #[test]
    fn test_count_capped() {
        let observations = obs(&[false; 6]);
        assert_eq!(qualifying_installments(CouponType::Phoenix, &observations, 4), 4);
    }

    #[test]
    fn test_installment_times_uneven_period() {
        assert_eq!(installment_times(1_000, 100, 3), vec![1_033, 1_066, 1_100]);
    }

    #[test]
    fn test_coupon_amount() {
        let coupon = Coupon {
            coupon_pct: 800,
            installments: 4,
            coupon_type: CouponType::Fixed,
            barrier_id: 0,
        };
        // 8% of 100.0 over 4 installments = 2.0 each; 3 paid on 2 units
        let amount = coupon_amount(&coupon, 3, 100_000_000, 2_000_000).unwrap();
        assert_eq!(amount, 12_000_000);
        assert_eq!(coupon_amount(&coupon, 0, 100_000_000, 2_000_000).unwrap(), 0);
    }

    #[test]
    fn test_coupon_amount_overflow() {
        let coupon = Coupon {
            coupon_pct: 10_000,
            installments: 1,
            coupon_type: CouponType::Fixed,
            barrier_id: 0,
        };
        assert_eq!(
            coupon_amount(&coupon, 1, u128::MAX / 2, 2),
            Err(SettlementError::Overflow("coupon amount"))
        );
    }
}
