//! Codec error types.
//!
//! This module provides structured error handling for encoding and decoding
//! operations. Encoders reject out-of-range fields before producing a word,
//! so a `CodecError` always means nothing was packed.

use thiserror::Error;

/// Codec-related errors.
///
/// # Variants
/// - `FieldOutOfRange`: A field does not fit its bit width
/// - `ZeroThreshold`: A barrier was given a 0% threshold (reserved for "no barrier")
/// - `InvalidFrequency` / `InvalidTriggerType` / `InvalidExerciseType` /
///   `InvalidCouponType` / `InvalidOptionKind`: Unknown discriminant in a packed word
/// - `ExerciseMismatch`: Stored exercise code disagrees with the frequency
/// - `TooManyCoupons` / `TooManyOptions`: Slot capacity exceeded
/// - `SlotOutOfRange`: Coupon slot index past the declared capacity
/// - `MalformedToken`: Option token bytes do not follow the token layout
/// - `InvalidPeriod`: Period outside `1..=min(expiry, MAX_PERIOD)`
/// - `InvalidParameter`: General structural validation failure
///
/// # Examples
/// ```
/// use note_core::types::CodecError;
///
/// let err = CodecError::FieldOutOfRange { field: "installments", value: 5000, max: 4095 };
/// assert!(format!("{}", err).contains("installments"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A field value does not fit its bit width.
    #[error("Field out of range: {field} = {value} (max {max})")]
    FieldOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: u64,
        /// Largest value the field can hold
        max: u64,
    },

    /// A barrier threshold of 0% was supplied.
    #[error("Barrier threshold must be non-zero")]
    ZeroThreshold,

    /// Unknown observation frequency code.
    #[error("Invalid observation frequency code: {0}")]
    InvalidFrequency(u8),

    /// Unknown trigger type code.
    #[error("Invalid trigger type code: {0}")]
    InvalidTriggerType(u8),

    /// Unknown exercise type code.
    #[error("Invalid exercise type code: {0}")]
    InvalidExerciseType(u8),

    /// Stored exercise code disagrees with the one derived from the frequency.
    #[error("Exercise code {stored} does not match frequency code {frequency}")]
    ExerciseMismatch {
        /// Frequency code found in the word
        frequency: u8,
        /// Exercise code found in the word
        stored: u8,
    },

    /// Unknown coupon type code.
    #[error("Invalid coupon type code: {0}")]
    InvalidCouponType(u8),

    /// Unknown option kind code.
    #[error("Invalid option kind code: {0}")]
    InvalidOptionKind(u8),

    /// More coupons than packed slots.
    #[error("Too many coupons: got {0}, capacity 4")]
    TooManyCoupons(usize),

    /// More options than slots.
    #[error("Too many options: got {0}, capacity 4")]
    TooManyOptions(usize),

    /// Slot index past the declared capacity.
    #[error("Slot index {index} out of range (capacity {capacity})")]
    SlotOutOfRange {
        /// Requested slot index
        index: usize,
        /// Number of slots
        capacity: usize,
    },

    /// Option token does not follow the token layout.
    #[error("Malformed option token: {0}")]
    MalformedToken(String),

    /// Period is zero, longer than the expiry, or wider than 40 bits.
    #[error("Invalid period: {period} (expiry {expiry})")]
    InvalidPeriod {
        /// The rejected period
        period: u64,
        /// Instrument expiry
        expiry: u64,
    },

    /// General structural validation failure.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the failure
        message: String,
    },
}
