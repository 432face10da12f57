//! In-memory price and breach store.
//!
//! Prices become final once `dispute_period` seconds have elapsed on the
//! store clock since they were reported. The clock is advanced explicitly,
//! so tests and replayed scenarios are deterministic.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use note_core::types::{BarrierId, InstrumentId};
use tracing::debug;

use super::{BreachReporter, PriceFeed, PriceOracle, PriceReport};
use crate::error::{Result, SettlementError};

#[derive(Debug, Clone, Copy)]
struct StoredPrice {
    price: u128,
    reported_at: u64,
}

/// Thread-safe in-memory [`PriceOracle`] and [`BreachReporter`].
///
/// # Examples
/// ```
/// use note_settlement::oracle::{InMemoryOracle, PriceFeed, PriceOracle};
///
/// let oracle = InMemoryOracle::new(60);
/// oracle.set_time(1_000);
/// let feed = PriceFeed { oracle_id: 0, base: 1, quote: 2 };
/// oracle.report_price(feed, 900, 25_000_000).unwrap();
///
/// let report = oracle.price_at(feed, 900).unwrap();
/// assert_eq!(report.price, 25_000_000);
/// assert!(!report.is_final);
///
/// oracle.set_time(1_060);
/// assert!(oracle.price_at(feed, 900).unwrap().is_final);
/// ```
#[derive(Debug)]
pub struct InMemoryOracle {
    prices: RwLock<BTreeMap<(PriceFeed, u64), StoredPrice>>,
    breaches: RwLock<HashMap<(InstrumentId, BarrierId), u64>>,
    now: AtomicU64,
    dispute_period: u64,
}

impl InMemoryOracle {
    /// Creates an empty store with the clock at 0.
    pub fn new(dispute_period: u64) -> Self {
        Self {
            prices: RwLock::new(BTreeMap::new()),
            breaches: RwLock::new(HashMap::new()),
            now: AtomicU64::new(0),
            dispute_period,
        }
    }

    /// Current store time.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Moves the store clock. Moving backwards is ignored.
    pub fn set_time(&self, now: u64) {
        self.now.fetch_max(now, Ordering::SeqCst);
    }

    /// Dispute window in seconds.
    #[inline]
    pub fn dispute_period(&self) -> u64 {
        self.dispute_period
    }

    /// Records a price observed at `timestamp`.
    ///
    /// A disputed (non-final) price may be overwritten; a final one may not.
    ///
    /// # Errors
    /// `FutureTimestamp` if `timestamp` is ahead of the clock, `Structural` when
    /// overwriting a final price.
    pub fn report_price(&self, feed: PriceFeed, timestamp: u64, price: u128) -> Result<()> {
        let now = self.now();
        if timestamp > now {
            return Err(SettlementError::FutureTimestamp {
                requested: timestamp,
                now,
            });
        }
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = prices.get(&(feed, timestamp)) {
            if self.is_final(existing.reported_at, now) {
                return Err(SettlementError::Structural(format!(
                    "price for {} at {} is final",
                    feed, timestamp
                )));
            }
        }
        prices.insert(
            (feed, timestamp),
            StoredPrice {
                price,
                reported_at: now,
            },
        );
        debug!(%feed, timestamp, price, "price reported");
        Ok(())
    }

    /// Records a crossing of a continuously monitored barrier.
    ///
    /// Only the earliest crossing is kept.
    pub fn record_continuous_breach(
        &self,
        instrument: InstrumentId,
        barrier_id: BarrierId,
        timestamp: u64,
    ) -> Result<()> {
        let now = self.now();
        if timestamp > now {
            return Err(SettlementError::FutureTimestamp {
                requested: timestamp,
                now,
            });
        }
        if timestamp == 0 {
            return Err(SettlementError::Structural(
                "breach timestamp 0 is reserved for \"never breached\"".to_string(),
            ));
        }
        let mut breaches = self.breaches.write().unwrap_or_else(PoisonError::into_inner);
        let entry = breaches.entry((instrument, barrier_id)).or_insert(timestamp);
        *entry = (*entry).min(timestamp);
        debug!(%instrument, barrier_id, first = *entry, "continuous breach recorded");
        Ok(())
    }

    /// Number of stored prices.
    pub fn len(&self) -> usize {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no price has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn is_final(&self, reported_at: u64, now: u64) -> bool {
        now >= reported_at.saturating_add(self.dispute_period)
    }
}

impl Default for InMemoryOracle {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PriceOracle for InMemoryOracle {
    fn price_at(&self, feed: PriceFeed, timestamp: u64) -> Result<PriceReport> {
        let now = self.now();
        if timestamp > now {
            return Err(SettlementError::FutureTimestamp {
                requested: timestamp,
                now,
            });
        }
        let prices = self.prices.read().unwrap_or_else(PoisonError::into_inner);
        let stored = prices
            .get(&(feed, timestamp))
            .ok_or(SettlementError::PriceNotReported { feed, timestamp })?;
        Ok(PriceReport {
            price: stored.price,
            is_final: self.is_final(stored.reported_at, now),
        })
    }
}

impl BreachReporter for InMemoryOracle {
    fn first_continuous_breach(&self, instrument: &InstrumentId, barrier_id: BarrierId) -> u64 {
        self.breaches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(*instrument, barrier_id))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: PriceFeed = PriceFeed {
        oracle_id: 0,
        base: 1,
        quote: 2,
    };

    #[test]
    fn test_price_not_reported() {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(100);
        assert_eq!(
            oracle.price_at(FEED, 50),
            Err(SettlementError::PriceNotReported {
                feed: FEED,
                timestamp: 50
            })
        );
    }

    #[test]
    fn test_future_timestamp() {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(100);
        assert!(matches!(
            oracle.report_price(FEED, 101, 1),
            Err(SettlementError::FutureTimestamp { requested: 101, now: 100 })
        ));
        assert!(matches!(
            oracle.price_at(FEED, 101),
            Err(SettlementError::FutureTimestamp { .. })
        ));
    }

    #[test]
    fn test_exact_timestamp_only() {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(100);
        oracle.report_price(FEED, 99, 5).unwrap();
        assert!(oracle.price_at(FEED, 98).is_err());
        assert_eq!(oracle.price_at(FEED, 99).unwrap().price, 5);
    }

    #[test]
    fn test_disputed_price_can_be_overwritten() {
        let oracle = InMemoryOracle::new(10);
        oracle.set_time(100);
        oracle.report_price(FEED, 90, 5).unwrap();
        oracle.report_price(FEED, 90, 6).unwrap();
        assert_eq!(oracle.price_at(FEED, 90).unwrap().price, 6);

        oracle.set_time(110);
        assert!(oracle.price_at(FEED, 90).unwrap().is_final);
        assert!(matches!(
            oracle.report_price(FEED, 90, 7),
            Err(SettlementError::Structural(_))
        ));
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(100);
        oracle.set_time(50);
        assert_eq!(oracle.now(), 100);
    }

    #[test]
    fn test_first_breach_keeps_earliest() {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(1_000);
        let id = InstrumentId::from_bytes([7u8; 32]);
        assert_eq!(oracle.first_continuous_breach(&id, 42), 0);

        oracle.record_continuous_breach(id, 42, 500).unwrap();
        oracle.record_continuous_breach(id, 42, 700).unwrap();
        assert_eq!(oracle.first_continuous_breach(&id, 42), 500);

        oracle.record_continuous_breach(id, 42, 300).unwrap();
        assert_eq!(oracle.first_continuous_breach(&id, 42), 300);
        assert_eq!(oracle.first_continuous_breach(&id, 43), 0);
    }

    #[test]
    fn test_breach_timestamp_zero_rejected() {
        let oracle = InMemoryOracle::new(0);
        assert!(oracle
            .record_continuous_breach(InstrumentId::ZERO, 1, 0)
            .is_err());
    }
}
