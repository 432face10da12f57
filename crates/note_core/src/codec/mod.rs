//! Bit-exact codec for structured note features.
//!
//! This module provides:
//! - Barrier packing into 32 bits (`barrier`)
//! - Coupon packing into 64 bits and the four-slot 256-bit field (`coupon`)
//! - Autocall packing (`autocall`)
//! - The vanilla option token layout (`token`)
//! - Compact/extended instruments and the instrument fingerprint (`instrument`)
//!
//! ## Range Discipline
//!
//! Encoders reject any field wider than its slot with
//! [`CodecError::FieldOutOfRange`](crate::types::CodecError::FieldOutOfRange)
//! instead of truncating. For every valid input `decode(encode(x)) == x`.

mod bits;

pub mod autocall;
pub mod barrier;
pub mod coupon;
pub mod instrument;
pub mod token;

pub use autocall::{decode_autocall, decode_optional_autocall, encode_autocall, Autocall};
pub use barrier::{decode_barrier, decode_optional_barrier, encode_barrier, exercise_code, Barrier};
pub use coupon::{
    decode_coupon, encode_coupon, get_coupons, parse_coupon_at, Coupon, CouponType, PackedCoupons,
};
pub use instrument::{
    instrument_id, serialize, ExtendedAutocall, ExtendedCoupon, ExtendedInstrument,
    ExtendedOption, Instrument, OptionLeg,
};
pub use token::{OptionKind, OptionToken};
