//! Price and breach-report collaborators.
//!
//! The core never ingests prices itself. It consumes two capabilities:
//! - [`PriceOracle`]: historical price of a feed at a timestamp, with a
//!   finality flag
//! - [`BreachReporter`]: the first recorded crossing of a continuously
//!   monitored barrier
//!
//! [`InMemoryOracle`] implements both for tests and the CLI.
//! [`PriceSnapshot`] gives one computation repeatable reads over either.

use std::fmt;

use note_core::types::{BarrierId, InstrumentId};

use crate::error::Result;

mod memory;
mod snapshot;

pub use memory::InMemoryOracle;
pub use snapshot::PriceSnapshot;

/// A price series: one oracle quoting `base` in units of `quote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceFeed {
    /// Oracle id.
    pub oracle_id: u8,
    /// Base (underlying) asset id.
    pub base: u8,
    /// Quote (strike) asset id.
    pub quote: u8,
}

impl fmt::Display for PriceFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.oracle_id, self.base, self.quote)
    }
}

/// A reported price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReport {
    /// Price at `UNIT_DECIMALS`.
    pub price: u128,
    /// Whether the dispute window has closed.
    pub is_final: bool,
}

/// Timestamp-indexed historical prices.
pub trait PriceOracle: Send + Sync {
    /// Price of `feed` at exactly `timestamp`.
    ///
    /// # Errors
    /// `PriceNotReported` if never written (even if `timestamp` is in the
    /// past), `FutureTimestamp` if `timestamp` is ahead of the oracle clock.
    fn price_at(&self, feed: PriceFeed, timestamp: u64) -> Result<PriceReport>;
}

/// Source of first-breach timestamps for continuously monitored barriers.
pub trait BreachReporter: Send + Sync {
    /// First breach timestamp recorded for the barrier, 0 if none.
    fn first_continuous_breach(&self, instrument: &InstrumentId, barrier_id: BarrierId) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_display() {
        let feed = PriceFeed {
            oracle_id: 3,
            base: 10,
            quote: 11,
        };
        assert_eq!(feed.to_string(), "3:10/11");
    }

    #[test]
    fn test_feed_ordering() {
        let a = PriceFeed {
            oracle_id: 0,
            base: 1,
            quote: 2,
        };
        let b = PriceFeed {
            oracle_id: 0,
            base: 1,
            quote: 3,
        };
        assert!(a < b);
    }
}
