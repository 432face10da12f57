//! Property-based tests for breach arithmetic and schedules.

use note_core::codec::CouponType;
use note_settlement::breach::{
    breach_threshold, discrete_observation_times, is_breached, Observation,
};
use note_settlement::payout::qualifying_installments;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The threshold is the smallest value whose scaled form covers spot * pct.
    #[test]
    fn prop_threshold_rounds_up(spot in 0u128..1u128 << 100, pct in 1u16..=u16::MAX) {
        let threshold = breach_threshold(spot, pct).unwrap();
        let exact = spot * u128::from(pct);
        prop_assert!(threshold * 10_000 >= exact);
        prop_assert!(threshold == 0 || (threshold - 1) * 10_000 < exact);
    }

    /// Equality never breaches and the direction follows the barrier side.
    #[test]
    fn prop_strict_comparison(threshold in 1u128..1u128 << 90, pct in 1u16..=u16::MAX) {
        prop_assert!(!is_breached(threshold, threshold, pct));
        if pct < 10_000 {
            prop_assert!(is_breached(threshold, threshold - 1, pct));
            prop_assert!(!is_breached(threshold, threshold + 1, pct));
        } else {
            prop_assert!(is_breached(threshold, threshold + 1, pct));
            prop_assert!(!is_breached(threshold, threshold - 1, pct));
        }
    }

    /// Schedules are strictly increasing, evenly spaced, and end within the period.
    #[test]
    fn prop_discrete_schedule_shape(
        creation in 0u64..1u64 << 40,
        period in 1u64..1u64 << 30,
        frequency in 1u64..1u64 << 26,
    ) {
        let times = discrete_observation_times(creation, period, frequency);
        prop_assert_eq!(times.len() as u64, period / frequency);
        for pair in times.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], frequency);
        }
        if let Some(last) = times.last() {
            prop_assert!(*last <= creation + period);
            prop_assert_eq!(times[0], creation + frequency);
        }
    }

    /// No coupon rule ever pays more installments than the coupon has.
    #[test]
    fn prop_installments_capped(
        pattern in proptest::collection::vec(any::<bool>(), 0..40),
        installments in 0u16..4_096,
    ) {
        let observations: Vec<Observation> = pattern
            .iter()
            .enumerate()
            .map(|(i, breached)| Observation { timestamp: i as u64 + 1, breached: *breached })
            .collect();
        for coupon_type in [
            CouponType::None,
            CouponType::Fixed,
            CouponType::Phoenix,
            CouponType::PhoenixMemory,
            CouponType::Vanilla,
        ] {
            let count = qualifying_installments(coupon_type, &observations, installments);
            prop_assert!(count <= u64::from(installments));
            prop_assert!(count <= observations.len() as u64);
        }
    }
}
