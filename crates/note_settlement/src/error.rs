//! Settlement error types.
//!
//! Every fallible operation in this crate returns [`SettlementError`]. No
//! operation returns partial results: an error means nothing was computed
//! and nothing was delegated.

use note_core::types::{BarrierId, CodecError, InstrumentId};
use thiserror::Error;

use crate::oracle::PriceFeed;

/// Error taxonomy used to decide whether a caller may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Out-of-range or malformed field during encoding.
    Encoding,
    /// Unregistered instrument, unset asset or engine mapping.
    Lookup,
    /// Data not available yet; retry once time or data catches up.
    Temporal,
    /// Caller or upstream-encoding bug; never retryable.
    Structural,
    /// Arithmetic overflow in payout computation.
    Arithmetic,
}

/// Settlement-related errors.
///
/// # Variants
/// - `Codec`: wrapped encoding error
/// - `NotRegistered` / `AlreadyRegistered`: registry lookups and duplicates
/// - `UnknownAsset` / `UnknownEngine`: directory lookups
/// - `PriceNotReported` / `PriceNotFinal` / `FutureTimestamp`: temporal
/// - `InvalidExerciseType` / `Structural` / `InvalidAmount`: structural
/// - `Overflow`: payout arithmetic overflow
///
/// # Examples
/// ```
/// use note_settlement::{ErrorKind, SettlementError};
///
/// let err = SettlementError::FutureTimestamp { requested: 10, now: 5 };
/// assert_eq!(err.kind(), ErrorKind::Temporal);
/// assert!(err.is_retryable());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Encoding error.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Instrument id not present in the registry.
    #[error("Instrument not registered: {0}")]
    NotRegistered(InstrumentId),

    /// Instrument id already present in the registry.
    #[error("Instrument already registered: {0}")]
    AlreadyRegistered(InstrumentId),

    /// Asset id not present in the directory.
    #[error("Unknown asset id: {0}")]
    UnknownAsset(u8),

    /// Engine id not present in the directory.
    #[error("Unknown engine id: {0}")]
    UnknownEngine(u8),

    /// No price was ever written for the feed at this timestamp.
    #[error("Price not reported for {feed} at {timestamp}")]
    PriceNotReported {
        /// Price feed queried
        feed: PriceFeed,
        /// Requested timestamp
        timestamp: u64,
    },

    /// A price exists but is still inside its dispute window.
    #[error("Price for {feed} at {timestamp} is not final")]
    PriceNotFinal {
        /// Price feed queried
        feed: PriceFeed,
        /// Requested timestamp
        timestamp: u64,
    },

    /// The requested timestamp lies in the future.
    #[error("Timestamp {requested} is in the future (now {now})")]
    FutureTimestamp {
        /// Requested timestamp
        requested: u64,
        /// Current store time
        now: u64,
    },

    /// Barrier id carries an unknown exercise discipline.
    #[error("Invalid exercise type {code} in barrier {barrier_id:#010x}")]
    InvalidExerciseType {
        /// Offending barrier id
        barrier_id: BarrierId,
        /// Raw exercise code
        code: u8,
    },

    /// Structural inconsistency (e.g. mismatched parallel lists, wrong trigger role).
    #[error("Structural error: {0}")]
    Structural(String),

    /// Settlement amount is zero or otherwise unusable.
    #[error("Invalid settlement amount: {0}")]
    InvalidAmount(u128),

    /// Checked arithmetic overflowed.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl SettlementError {
    /// Classifies this error in the taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::Codec(CodecError::InvalidExerciseType(_))
            | SettlementError::Codec(CodecError::ExerciseMismatch { .. }) => ErrorKind::Structural,
            SettlementError::Codec(_) => ErrorKind::Encoding,
            SettlementError::NotRegistered(_)
            | SettlementError::UnknownAsset(_)
            | SettlementError::UnknownEngine(_) => ErrorKind::Lookup,
            SettlementError::PriceNotReported { .. }
            | SettlementError::PriceNotFinal { .. }
            | SettlementError::FutureTimestamp { .. } => ErrorKind::Temporal,
            SettlementError::AlreadyRegistered(_)
            | SettlementError::InvalidExerciseType { .. }
            | SettlementError::Structural(_)
            | SettlementError::InvalidAmount(_) => ErrorKind::Structural,
            SettlementError::Overflow(_) => ErrorKind::Arithmetic,
        }
    }

    /// Returns whether retrying later may succeed.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Temporal
    }
}

/// Result alias for settlement operations.
pub type Result<T> = std::result::Result<T, SettlementError>;
