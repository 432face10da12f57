//! Per-component payout computation.
//!
//! For a registered instrument and a settlement amount (units held, at
//! `UNIT_DECIMALS`), the calculator:
//!
//! 1. determines the termination time from the autocall, if any
//! 2. pays each coupon for its qualifying installments up to termination
//! 3. pays each option leg that expires by termination, subject to its
//!    knock-in / knock-out barrier
//!
//! Every price is read through one [`PriceSnapshot`] so the result is
//! consistent within the call. Zero components are omitted. The calculation
//! has no side effects; see [`crate::settlement`] for delegation.

mod coupon;

use std::fmt;

use note_core::codec::decode_barrier;
use note_core::types::{
    BarrierId, InstrumentId, TokenRef, TriggerType, MAX_PAYOUT, PERCENT_SCALE, UNIT,
    UNIT_DECIMALS,
};
use tracing::debug;

use crate::breach::{InstrumentObserver, Observation};
use crate::directory::{convert_decimals, AssetDirectory};
use crate::error::{Result, SettlementError};
use crate::options::OptionPayoff;
use crate::oracle::{BreachReporter, PriceOracle, PriceSnapshot};
use crate::registry::InstrumentRegistry;
use crate::SettlementConfig;

pub use coupon::{coupon_amount, installment_times, qualifying_installments};

/// Component category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ComponentKind {
    /// Coupon slot.
    Coupon,
    /// Option slot.
    Option,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Coupon => f.write_str("coupon"),
            ComponentKind::Option => f.write_str("option"),
        }
    }
}

/// What a component pays out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PayoutTarget {
    /// Collateral asset id (coupons).
    Collateral(u8),
    /// Option token (options).
    Token(TokenRef),
}

impl fmt::Display for PayoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoutTarget::Collateral(id) => write!(f, "asset:{}", id),
            PayoutTarget::Token(token) => write!(f, "token:{}", token),
        }
    }
}

/// One settled component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentPayout {
    /// Slot index within its kind.
    pub index: usize,
    /// Coupon or option.
    pub kind: ComponentKind,
    /// Asset or token paid.
    pub target: PayoutTarget,
    /// Margin engine routing the payout.
    pub engine_id: u8,
    /// Amount in the paying asset's decimals.
    pub amount: u128,
}

/// Termination time of an instrument.
///
/// Without an autocall this is expiry. Otherwise it is the first autocall
/// observation that triggers: a breach for a normal autocall, a non-breach
/// for a reverse one. If none triggers, expiry.
pub fn termination(observer: &InstrumentObserver<'_, '_>) -> Result<u64> {
    let instrument = observer.instrument();
    let Some(autocall) = instrument.autocall()? else {
        return Ok(instrument.expiry);
    };
    let triggers = |o: &Observation| o.breached != autocall.is_reverse;
    let observations =
        observer.observe_until(autocall.barrier_id, instrument.expiry, triggers)?;
    let triggered = observations
        .last()
        .filter(|o| triggers(*o))
        .map(|o| o.timestamp);
    Ok(triggered.unwrap_or(instrument.expiry))
}

/// Registry-backed payout calculator.
pub struct PayoutCalculator<'a> {
    registry: &'a InstrumentRegistry,
    oracle: &'a dyn PriceOracle,
    reporter: &'a dyn BreachReporter,
    directory: &'a dyn AssetDirectory,
    payoff: &'a dyn OptionPayoff,
    config: SettlementConfig,
}

impl<'a> PayoutCalculator<'a> {
    /// Creates a calculator over the given collaborators.
    pub fn new(
        registry: &'a InstrumentRegistry,
        oracle: &'a dyn PriceOracle,
        reporter: &'a dyn BreachReporter,
        directory: &'a dyn AssetDirectory,
        payoff: &'a dyn OptionPayoff,
        config: SettlementConfig,
    ) -> Self {
        Self {
            registry,
            oracle,
            reporter,
            directory,
            payoff,
            config,
        }
    }

    /// Per-component payouts of `settlement_amount` units of instrument `id`.
    ///
    /// # Errors
    /// `NotRegistered`, `InvalidAmount` for a zero amount, any temporal error
    /// from the price store, `Structural` for an autocall-trigger barrier on
    /// an option, `Overflow`. On error nothing is returned.
    pub fn instrument_payout(
        &self,
        id: &InstrumentId,
        settlement_amount: u128,
    ) -> Result<Vec<ComponentPayout>> {
        let instrument = self.registry.get(id)?;
        if settlement_amount == 0 {
            return Err(SettlementError::InvalidAmount(settlement_amount));
        }
        let snapshot = PriceSnapshot::new(
            self.oracle,
            self.reporter,
            instrument.oracle_id,
            self.config.require_final_prices,
        );
        let observer = InstrumentObserver::new(*id, &instrument, &snapshot);
        let terminated_at = termination(&observer)?;
        debug!(instrument = %id, termination = terminated_at, "Termination resolved");

        let mut payouts = self.coupon_payouts(&observer, terminated_at, settlement_amount)?;
        payouts.extend(self.option_payouts(&observer, terminated_at, settlement_amount)?);
        Ok(payouts)
    }

    fn coupon_payouts(
        &self,
        observer: &InstrumentObserver<'_, '_>,
        terminated_at: u64,
        settlement_amount: u128,
    ) -> Result<Vec<ComponentPayout>> {
        let instrument = observer.instrument();
        let slots = instrument.coupon_slots()?;
        if slots.is_empty() {
            return Ok(Vec::new());
        }
        let initial_spot = observer.initial_spot()?;

        let mut payouts = Vec::new();
        for (index, coupon) in slots {
            let observations: Vec<Observation> = if coupon.barrier_id == 0 {
                installment_times(instrument.creation(), instrument.period, coupon.installments)
                    .into_iter()
                    .take_while(|ts| *ts <= terminated_at)
                    .map(|timestamp| Observation {
                        timestamp,
                        breached: false,
                    })
                    .collect()
            } else {
                observer.observe(coupon.barrier_id, terminated_at)?
            };
            let count =
                qualifying_installments(coupon.coupon_type, &observations, coupon.installments);
            let amount = coupon_amount(&coupon, count, initial_spot, settlement_amount)?;
            debug!(
                slot = index,
                coupon_type = %coupon.coupon_type,
                observations = observations.len(),
                count,
                amount,
                "Coupon evaluated"
            );
            if amount == 0 {
                continue;
            }
            let decimals = self.directory.asset(instrument.collateral_id)?.decimals;
            payouts.push(ComponentPayout {
                index,
                kind: ComponentKind::Coupon,
                target: PayoutTarget::Collateral(instrument.collateral_id),
                engine_id: instrument.engine_id,
                amount: checked_payout(convert_decimals(amount, UNIT_DECIMALS, decimals)?)?,
            });
        }
        Ok(payouts)
    }

    fn option_payouts(
        &self,
        observer: &InstrumentObserver<'_, '_>,
        terminated_at: u64,
        settlement_amount: u128,
    ) -> Result<Vec<ComponentPayout>> {
        let instrument = observer.instrument();
        let mut payouts = Vec::new();
        for (index, leg) in instrument.option_slots() {
            let terms = self.payoff.terms(&leg.token)?;
            if terminated_at < terms.expiry {
                debug!(slot = index, expiry = terms.expiry, "Option not expired at termination");
                continue;
            }
            if !knock_condition_met(observer, leg.barrier_id, terminated_at)? {
                debug!(slot = index, barrier_id = leg.barrier_id, "Option knocked out");
                continue;
            }
            let per_unit = self.payoff.payout_per_unit(&leg.token, observer.snapshot())?;
            let overflow = || SettlementError::Overflow("option amount");
            let amount = per_unit
                .checked_mul(u128::from(leg.participation_pct))
                .ok_or_else(overflow)?
                / PERCENT_SCALE;
            let amount = amount.checked_mul(settlement_amount).ok_or_else(overflow)? / UNIT;
            debug!(slot = index, per_unit, amount, "Option evaluated");
            if amount == 0 {
                continue;
            }
            let decimals = self.directory.asset(terms.collateral_id)?.decimals;
            payouts.push(ComponentPayout {
                index,
                kind: ComponentKind::Option,
                target: PayoutTarget::Token(leg.token),
                engine_id: instrument.engine_id,
                amount: checked_payout(convert_decimals(amount, UNIT_DECIMALS, decimals)?)?,
            });
        }
        Ok(payouts)
    }
}

/// Whether an option leg's barrier lets it pay.
///
/// No barrier always pays. Knock-out pays unless breached by termination;
/// knock-in pays only if breached by termination.
fn knock_condition_met(
    observer: &InstrumentObserver<'_, '_>,
    barrier_id: BarrierId,
    terminated_at: u64,
) -> Result<bool> {
    if barrier_id == 0 {
        return Ok(true);
    }
    let barrier = decode_barrier(barrier_id)?;
    let breached = || -> Result<bool> {
        Ok(observer
            .observe(barrier_id, terminated_at)?
            .iter()
            .any(|o| o.breached))
    };
    match barrier.trigger {
        TriggerType::KnockOut => Ok(!breached()?),
        TriggerType::KnockIn => breached(),
        TriggerType::Autocall => Err(SettlementError::Structural(format!(
            "option barrier {:#010x} uses the autocall trigger",
            barrier_id
        ))),
    }
}

fn checked_payout(amount: u128) -> Result<u128> {
    if amount > MAX_PAYOUT {
        Err(SettlementError::Overflow("component payout"))
    } else {
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::codec::{encode_autocall, encode_barrier, Instrument, PackedCoupons};
    use note_core::types::ObservationFrequency;

    use crate::oracle::{InMemoryOracle, PriceFeed};

    const FEED: PriceFeed = PriceFeed {
        oracle_id: 0,
        base: 1,
        quote: 2,
    };
    const DAY: u64 = 86_400;

    fn with_autocall(autocall_id: u64) -> Instrument {
        Instrument {
            oracle_id: 0,
            engine_id: 0,
            underlying_id: 1,
            strike_id: 2,
            collateral_id: 2,
            expiry: 100 + 4 * DAY,
            period: 4 * DAY,
            autocall_id,
            coupons: PackedCoupons::EMPTY,
            options: vec![],
        }
    }

    fn daily_prices(prices: &[u128]) -> InMemoryOracle {
        let oracle = InMemoryOracle::new(0);
        oracle.set_time(1_000_000);
        for (k, price) in prices.iter().enumerate() {
            oracle.report_price(FEED, 100 + k as u64 * DAY, *price).unwrap();
        }
        oracle
    }

    #[test]
    fn test_termination_without_autocall() {
        let inst = with_autocall(0);
        let oracle = daily_prices(&[]);
        let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
        let observer = InstrumentObserver::new(inst.id(), &inst, &snapshot);
        assert_eq!(termination(&observer).unwrap(), inst.expiry);
        assert_eq!(snapshot.price_reads(), 0);
    }

    #[test]
    fn test_termination_first_trigger() {
        let barrier =
            encode_barrier(11_000, ObservationFrequency::OneDay, TriggerType::Autocall).unwrap();
        let inst = with_autocall(encode_autocall(false, barrier).unwrap());
        let oracle = daily_prices(&[1_000, 1_050, 1_150, 1_200, 900]);
        let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
        let observer = InstrumentObserver::new(inst.id(), &inst, &snapshot);
        assert_eq!(termination(&observer).unwrap(), 100 + 2 * DAY);
    }

    #[test]
    fn test_reverse_termination() {
        let barrier =
            encode_barrier(9_000, ObservationFrequency::OneDay, TriggerType::Autocall).unwrap();
        let inst = with_autocall(encode_autocall(true, barrier).unwrap());
        // breached (below 900) on day 1 and 2, not breached on day 3
        let oracle = daily_prices(&[1_000, 800, 850, 950, 990]);
        let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
        let observer = InstrumentObserver::new(inst.id(), &inst, &snapshot);
        assert_eq!(termination(&observer).unwrap(), 100 + 3 * DAY);
    }

    #[test]
    fn test_untriggered_autocall_runs_to_expiry() {
        let barrier =
            encode_barrier(15_000, ObservationFrequency::OneDay, TriggerType::Autocall).unwrap();
        let inst = with_autocall(encode_autocall(false, barrier).unwrap());
        let oracle = daily_prices(&[1_000, 1_000, 1_000, 1_000, 1_000]);
        let snapshot = PriceSnapshot::new(&oracle, &oracle, 0, true);
        let observer = InstrumentObserver::new(inst.id(), &inst, &snapshot);
        assert_eq!(termination(&observer).unwrap(), inst.expiry);
    }

    #[test]
    fn test_checked_payout_bound() {
        assert_eq!(checked_payout(MAX_PAYOUT).unwrap(), MAX_PAYOUT);
        assert!(checked_payout(MAX_PAYOUT + 1).is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(PayoutTarget::Collateral(3).to_string(), "asset:3");
        assert_eq!(ComponentKind::Option.to_string(), "option");
    }
}
