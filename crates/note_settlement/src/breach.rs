//! Barrier breach evaluation.
//!
//! A barrier is observed according to its exercise discipline:
//!
//! - **European**: one observation at expiry
//! - **Continuous**: the first crossing recorded by a [`BreachReporter`],
//!   re-validated against the price at that timestamp
//! - **Discrete**: `creation + k * frequency` for `k = 1..=period / frequency`
//!
//! Breach records are fixed-shape: one entry per observation, holding the
//! observation timestamp if breached and 0 otherwise.
//!
//! [`BreachReporter`]: crate::oracle::BreachReporter

use note_core::codec::{decode_barrier, exercise_code, Barrier, Instrument};
use note_core::types::{BarrierId, ExerciseType, InstrumentId, PERCENT_SCALE};
use tracing::{debug, warn};

use crate::error::{Result, SettlementError};
use crate::oracle::{BreachReporter, PriceOracle, PriceSnapshot};
use crate::registry::InstrumentRegistry;
use crate::SettlementConfig;

/// Returns whether `price` breaches `threshold`.
///
/// Downside barriers (`pct < 100%`) breach strictly below the threshold,
/// upside barriers (`pct >= 100%`) strictly above. Equality never breaches.
///
/// # Examples
/// ```
/// use note_settlement::breach::is_breached;
///
/// assert!(!is_breached(1_000, 1_000, 12_000));
/// assert!(is_breached(1_000, 1_001, 12_000));
/// assert!(!is_breached(1_000, 1_000, 8_000));
/// assert!(is_breached(1_000, 999, 8_000));
/// ```
#[inline]
pub fn is_breached(threshold: u128, price: u128, pct: u16) -> bool {
    if u128::from(pct) < PERCENT_SCALE {
        price < threshold
    } else {
        price > threshold
    }
}

/// Barrier level for a given initial spot: `ceil(initial_spot * pct / 10_000)`.
///
/// # Errors
/// `Overflow` if the product overflows `u128`.
pub fn breach_threshold(initial_spot: u128, pct: u16) -> Result<u128> {
    let scaled = initial_spot
        .checked_mul(u128::from(pct))
        .ok_or(SettlementError::Overflow("breach threshold"))?;
    Ok(scaled.div_ceil(PERCENT_SCALE))
}

/// Lazy discrete observation schedule.
///
/// `period / frequency_secs` timestamps at `creation + k * frequency_secs`.
/// A zero frequency yields nothing.
pub fn discrete_schedule(
    creation: u64,
    period: u64,
    frequency_secs: u64,
) -> impl Iterator<Item = u64> {
    let count = period.checked_div(frequency_secs).unwrap_or(0);
    (1..=count).map(move |k| creation.saturating_add(k.saturating_mul(frequency_secs)))
}

/// Discrete observation schedule, collected.
///
/// # Examples
/// ```
/// use note_settlement::breach::discrete_observation_times;
///
/// assert_eq!(discrete_observation_times(100, 400, 100), vec![200, 300, 400, 500]);
/// assert!(discrete_observation_times(100, 50, 100).is_empty());
/// ```
pub fn discrete_observation_times(creation: u64, period: u64, frequency_secs: u64) -> Vec<u64> {
    discrete_schedule(creation, period, frequency_secs).collect()
}

/// Observation timestamps of a barrier on an instrument expiring at `expiry`
/// after `period` seconds.
///
/// European and Continuous barriers have the single slot `[expiry]`.
pub fn observation_times(barrier: &Barrier, expiry: u64, period: u64) -> Vec<u64> {
    match barrier.exercise() {
        ExerciseType::European | ExerciseType::Continuous => vec![expiry],
        ExerciseType::Discrete => discrete_observation_times(
            expiry.saturating_sub(period),
            period,
            barrier.frequency.seconds(),
        ),
    }
}

/// One evaluated observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Observation time (the breach time for a confirmed continuous breach).
    pub timestamp: u64,
    /// Whether the barrier was breached.
    pub breached: bool,
}

impl Observation {
    /// Breach-record entry: the timestamp if breached, else 0.
    #[inline]
    pub fn record(&self) -> u64 {
        if self.breached {
            self.timestamp
        } else {
            0
        }
    }
}

/// Evaluates barriers of one instrument over one [`PriceSnapshot`].
pub struct InstrumentObserver<'s, 'o> {
    id: InstrumentId,
    instrument: &'s Instrument,
    snapshot: &'s PriceSnapshot<'o>,
}

impl<'s, 'o> InstrumentObserver<'s, 'o> {
    /// Binds an instrument to a snapshot opened on its oracle.
    pub fn new(
        id: InstrumentId,
        instrument: &'s Instrument,
        snapshot: &'s PriceSnapshot<'o>,
    ) -> Self {
        Self {
            id,
            instrument,
            snapshot,
        }
    }

    /// Instrument under observation.
    #[inline]
    pub fn instrument(&self) -> &'s Instrument {
        self.instrument
    }

    /// Snapshot prices are read through.
    #[inline]
    pub fn snapshot(&self) -> &'s PriceSnapshot<'o> {
        self.snapshot
    }

    /// Underlying price at creation.
    pub fn initial_spot(&self) -> Result<u128> {
        self.price_at(self.instrument.creation())
    }

    /// Full breach record of a barrier.
    ///
    /// # Errors
    /// `InvalidExerciseType` for an unknown exercise code, codec errors for an
    /// otherwise malformed id, temporal errors for missing prices.
    pub fn breaches(&self, barrier_id: BarrierId) -> Result<Vec<u64>> {
        Ok(self
            .observe(barrier_id, u64::MAX)?
            .iter()
            .map(Observation::record)
            .collect())
    }

    /// Evaluates the observations of a barrier at or before `horizon`.
    ///
    /// Observations after the horizon are not evaluated and no price after
    /// the horizon is read. A continuous barrier yields its confirmed breach
    /// if within the horizon, otherwise a non-breached observation at expiry
    /// when expiry is within the horizon.
    pub fn observe(&self, barrier_id: BarrierId, horizon: u64) -> Result<Vec<Observation>> {
        self.observe_until(barrier_id, horizon, |_| false)
    }

    /// Like [`observe`](Self::observe), but stops after the first observation
    /// for which `stop` returns true. That observation is the last element.
    pub fn observe_until<F>(
        &self,
        barrier_id: BarrierId,
        horizon: u64,
        mut stop: F,
    ) -> Result<Vec<Observation>>
    where
        F: FnMut(&Observation) -> bool,
    {
        let code = exercise_code(barrier_id);
        ExerciseType::from_code(code)
            .map_err(|_| SettlementError::InvalidExerciseType { barrier_id, code })?;
        let barrier = decode_barrier(barrier_id)?;
        let expiry = self.instrument.expiry;

        match barrier.exercise() {
            ExerciseType::European => {
                if expiry > horizon {
                    return Ok(Vec::new());
                }
                let threshold = self.threshold(&barrier)?;
                let breached = is_breached(threshold, self.price_at(expiry)?, barrier.threshold_pct);
                debug!(instrument = %self.id, barrier_id, breached, "European observation");
                Ok(vec![Observation {
                    timestamp: expiry,
                    breached,
                }])
            }
            ExerciseType::Continuous => {
                let breached_at = self.confirmed_breach(barrier_id, &barrier)?;
                match breached_at {
                    Some(ts) if ts <= horizon => Ok(vec![Observation {
                        timestamp: ts,
                        breached: true,
                    }]),
                    _ if expiry <= horizon => Ok(vec![Observation {
                        timestamp: expiry,
                        breached: false,
                    }]),
                    _ => Ok(Vec::new()),
                }
            }
            ExerciseType::Discrete => {
                let period = self.instrument.period;
                let mut times = discrete_schedule(
                    expiry.saturating_sub(period),
                    period,
                    barrier.frequency.seconds(),
                )
                .take_while(|ts| *ts <= horizon)
                .peekable();
                if times.peek().is_none() {
                    return Ok(Vec::new());
                }
                let threshold = self.threshold(&barrier)?;
                let mut observations = Vec::new();
                for timestamp in times {
                    let observation = Observation {
                        timestamp,
                        breached: is_breached(
                            threshold,
                            self.price_at(timestamp)?,
                            barrier.threshold_pct,
                        ),
                    };
                    observations.push(observation);
                    if stop(&observation) {
                        break;
                    }
                }
                debug!(
                    instrument = %self.id,
                    barrier_id,
                    observations = observations.len(),
                    breaches = observations.iter().filter(|o| o.breached).count(),
                    "Discrete observations"
                );
                Ok(observations)
            }
        }
    }

    /// Reporter's first-breach pointer, confirmed against the price.
    ///
    /// A pointer of 0 or past expiry is "no breach" and reads no price.
    fn confirmed_breach(&self, barrier_id: BarrierId, barrier: &Barrier) -> Result<Option<u64>> {
        let ts = self.snapshot.first_breach(&self.id, barrier_id);
        if ts == 0 || ts > self.instrument.expiry {
            return Ok(None);
        }
        let threshold = self.threshold(barrier)?;
        let price = self.price_at(ts)?;
        if is_breached(threshold, price, barrier.threshold_pct) {
            Ok(Some(ts))
        } else {
            warn!(
                instrument = %self.id,
                barrier_id,
                timestamp = ts,
                price,
                threshold,
                "Reported continuous breach not confirmed by price"
            );
            Ok(None)
        }
    }

    fn threshold(&self, barrier: &Barrier) -> Result<u128> {
        breach_threshold(self.initial_spot()?, barrier.threshold_pct)
    }

    fn price_at(&self, timestamp: u64) -> Result<u128> {
        self.snapshot.price(
            self.instrument.underlying_id,
            self.instrument.strike_id,
            timestamp,
        )
    }
}

/// Registry-backed breach evaluator.
pub struct BreachEvaluator<'a> {
    registry: &'a InstrumentRegistry,
    oracle: &'a dyn PriceOracle,
    reporter: &'a dyn BreachReporter,
    config: SettlementConfig,
}

impl<'a> BreachEvaluator<'a> {
    /// Creates an evaluator over the given collaborators.
    pub fn new(
        registry: &'a InstrumentRegistry,
        oracle: &'a dyn PriceOracle,
        reporter: &'a dyn BreachReporter,
        config: SettlementConfig,
    ) -> Self {
        Self {
            registry,
            oracle,
            reporter,
            config,
        }
    }

    /// Breach record of `barrier_id` on a registered instrument.
    ///
    /// # Errors
    /// `NotRegistered` for an unknown instrument, otherwise as
    /// [`InstrumentObserver::breaches`].
    pub fn barrier_breaches(&self, id: &InstrumentId, barrier_id: BarrierId) -> Result<Vec<u64>> {
        let instrument = self.registry.get(id)?;
        let snapshot = PriceSnapshot::new(
            self.oracle,
            self.reporter,
            instrument.oracle_id,
            self.config.require_final_prices,
        );
        InstrumentObserver::new(*id, &instrument, &snapshot).breaches(barrier_id)
    }
}
