//! Identifier, enumeration and unit types.
//!
//! This module provides:
//! - `InstrumentId`, `TokenRef`: 256-bit identifiers (`ids`)
//! - `ObservationFrequency`: barrier observation schedule (`frequency`)
//! - `ExerciseType`, `TriggerType`: barrier discipline and role (`exercise`)
//! - Unit constants such as `UNIT` and `PERCENT_SCALE` (`units`)
//! - `CodecError` (`error`)

pub mod error;
pub mod exercise;
pub mod frequency;
pub mod ids;
pub mod units;

pub use error::CodecError;
pub use exercise::{ExerciseType, TriggerType};
pub use frequency::ObservationFrequency;
pub use ids::{InstrumentId, TokenRef};
pub use units::{
    MAX_COUPONS, MAX_OPTIONS, MAX_PAYOUT, MAX_PERIOD, PERCENT_SCALE, UNIT, UNIT_DECIMALS,
};

/// Packed barrier identifier (`0` = no barrier).
pub type BarrierId = u32;

/// Packed coupon identifier (`0` = empty slot).
pub type CouponId = u64;

/// Packed autocall identifier (`0` = no autocall).
pub type AutocallId = u64;
