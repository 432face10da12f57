//! Fixed-point unit conventions shared by the codec and the payout layer.

/// Two-decimal fixed-point representation of 100%.
pub const PERCENT_SCALE: u128 = 10_000;

/// Decimals used for prices, per-unit payouts and settlement amounts.
pub const UNIT_DECIMALS: u8 = 6;

/// One whole unit at [`UNIT_DECIMALS`].
pub const UNIT: u128 = 1_000_000;

/// Largest component payout (80 bits).
pub const MAX_PAYOUT: u128 = (1u128 << 80) - 1;

/// Largest instrument period in seconds (40 bits).
pub const MAX_PERIOD: u64 = (1u64 << 40) - 1;

/// Number of packed coupon slots.
pub const MAX_COUPONS: usize = 4;

/// Number of option slots.
pub const MAX_OPTIONS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_matches_decimals() {
        assert_eq!(UNIT, 10u128.pow(UNIT_DECIMALS as u32));
    }

    #[test]
    fn test_widths() {
        assert_eq!(MAX_PAYOUT, 1_208_925_819_614_629_174_706_175);
        assert_eq!(MAX_PERIOD, 1_099_511_627_775);
    }
}
