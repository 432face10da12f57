//! # note_settlement: Breach Evaluation and Payouts for Structured Notes
//!
//! ## Layer 2 (Business Logic) Role
//!
//! note_settlement builds on the note_core codec and provides:
//! - A content-addressed instrument registry (`registry`)
//! - Price and breach-report collaborators with an in-memory store (`oracle`)
//! - Barrier breach evaluation for European, Continuous and Discrete
//!   barriers (`breach`)
//! - Per-component coupon and option payouts (`payout`, `options`)
//! - Asset metadata and decimal conversion (`directory`)
//! - The settlement service delegating to a margin engine (`settlement`)
//!
//! ## Usage Examples
//!
//! ```rust
//! use note_settlement::breach::{breach_threshold, is_breached};
//!
//! // 80% downside barrier on an initial spot of 1_000.5
//! let threshold = breach_threshold(1_000_500_000, 8_000).unwrap();
//! assert_eq!(threshold, 800_400_000);
//! assert!(is_breached(threshold, 800_399_999, 8_000));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for payouts and configuration

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod breach;
pub mod config;
pub mod directory;
pub mod error;
pub mod options;
pub mod oracle;
pub mod payout;
pub mod registry;
pub mod settlement;

pub use breach::BreachEvaluator;
pub use config::SettlementConfig;
pub use error::{ErrorKind, Result, SettlementError};
pub use payout::{ComponentKind, ComponentPayout, PayoutCalculator, PayoutTarget};
pub use registry::InstrumentRegistry;
pub use settlement::{CreditRecord, MarginEngine, RecordingEngine, SettlementService};

pub use note_core::codec::{
    decode_autocall, decode_barrier, decode_coupon, encode_autocall, encode_barrier,
    encode_coupon, get_coupons, instrument_id, parse_coupon_at, serialize,
};
