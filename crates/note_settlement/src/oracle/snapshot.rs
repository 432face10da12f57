//! Per-computation read cache.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use note_core::types::{BarrierId, InstrumentId};

use super::{BreachReporter, PriceFeed, PriceOracle};
use crate::error::{Result, SettlementError};

/// Repeatable view over a [`PriceOracle`] and a [`BreachReporter`] for the
/// duration of one evaluation.
///
/// The first successful read of each `(pair, timestamp)` and each first-breach
/// pointer is memoised; later reads of the same key return the cached value
/// even if the underlying store has changed meanwhile. Failed reads are not
/// cached.
///
/// A snapshot is bound to a single oracle id and is not `Sync`: open one per
/// call.
///
/// # Examples
/// ```
/// use note_settlement::oracle::{InMemoryOracle, PriceFeed, PriceSnapshot};
///
/// let oracle = InMemoryOracle::new(0);
/// oracle.set_time(100);
/// oracle.report_price(PriceFeed { oracle_id: 0, base: 1, quote: 2 }, 50, 7).unwrap();
///
/// let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
/// assert_eq!(snapshot.price(1, 2, 50).unwrap(), 7);
/// assert_eq!(snapshot.price(1, 2, 50).unwrap(), 7);
/// assert_eq!(snapshot.price_reads(), 1);
/// ```
pub struct PriceSnapshot<'a> {
    oracle: &'a dyn PriceOracle,
    reporter: &'a dyn BreachReporter,
    oracle_id: u8,
    require_final: bool,
    prices: RefCell<HashMap<(u8, u8, u64), u128>>,
    pointers: RefCell<HashMap<(InstrumentId, BarrierId), u64>>,
    price_reads: Cell<usize>,
}

impl<'a> PriceSnapshot<'a> {
    /// Opens an empty snapshot over `oracle` and `reporter`.
    pub fn new(
        oracle: &'a dyn PriceOracle,
        reporter: &'a dyn BreachReporter,
        oracle_id: u8,
        require_final: bool,
    ) -> Self {
        Self {
            oracle,
            reporter,
            oracle_id,
            require_final,
            prices: RefCell::new(HashMap::new()),
            pointers: RefCell::new(HashMap::new()),
            price_reads: Cell::new(0),
        }
    }

    /// Oracle id this snapshot reads from.
    #[inline]
    pub fn oracle_id(&self) -> u8 {
        self.oracle_id
    }

    /// Price of `base` in `quote` at exactly `timestamp`.
    ///
    /// # Errors
    /// Propagates oracle errors; `PriceNotFinal` if finality is required and
    /// the price is still disputable.
    pub fn price(&self, base: u8, quote: u8, timestamp: u64) -> Result<u128> {
        if let Some(price) = self.prices.borrow().get(&(base, quote, timestamp)) {
            return Ok(*price);
        }
        let feed = PriceFeed {
            oracle_id: self.oracle_id,
            base,
            quote,
        };
        self.price_reads.set(self.price_reads.get() + 1);
        let report = self.oracle.price_at(feed, timestamp)?;
        if self.require_final && !report.is_final {
            return Err(SettlementError::PriceNotFinal { feed, timestamp });
        }
        self.prices
            .borrow_mut()
            .insert((base, quote, timestamp), report.price);
        Ok(report.price)
    }

    /// First recorded continuous breach of a barrier, 0 if none.
    pub fn first_breach(&self, instrument: &InstrumentId, barrier_id: BarrierId) -> u64 {
        *self
            .pointers
            .borrow_mut()
            .entry((*instrument, barrier_id))
            .or_insert_with(|| self.reporter.first_continuous_breach(instrument, barrier_id))
    }

    /// Number of reads forwarded to the underlying oracle.
    #[inline]
    pub fn price_reads(&self) -> usize {
        self.price_reads.get()
    }
}
