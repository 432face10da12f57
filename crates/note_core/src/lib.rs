//! # note_core: Codec Foundation for Structured Notes
//!
//! ## Layer 1 (Foundation) Role
//!
//! note_core is the bottom layer of the workspace and provides:
//! - Bit-exact packing of barriers, coupons and autocalls (`codec`)
//! - The option-token layout referenced by option legs (`codec::token`)
//! - Compact and extended instrument descriptions, plus the content-addressed
//!   `InstrumentId` fingerprint (`codec::instrument`)
//! - Identifier newtypes, unit constants and `CodecError` (`types`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates and performs no I/O.
//! Every function here is pure; equal inputs always give equal outputs.
//!
//! ## Usage Examples
//!
//! ```rust
//! use note_core::codec::{decode_barrier, encode_barrier};
//! use note_core::types::{ExerciseType, ObservationFrequency, TriggerType};
//!
//! let id = encode_barrier(8_000, ObservationFrequency::OneMonth, TriggerType::KnockIn).unwrap();
//! let barrier = decode_barrier(id).unwrap();
//!
//! assert_eq!(barrier.threshold_pct, 8_000);
//! assert_eq!(barrier.exercise(), ExerciseType::Discrete);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for identifiers and instrument
//!   descriptions

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod codec;
pub mod types;

pub use codec::{
    instrument_id, serialize, Autocall, Barrier, Coupon, ExtendedAutocall, ExtendedCoupon,
    ExtendedInstrument, ExtendedOption, Instrument, OptionLeg, OptionToken, PackedCoupons,
};
pub use types::{CodecError, InstrumentId, TokenRef};
