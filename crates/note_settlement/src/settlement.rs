//! Settlement service and margin-engine boundary.
//!
//! [`SettlementService`] is the external surface of the crate: it owns the
//! registry and the collaborators, evaluates breaches and payouts, and
//! delegates settled amounts to a [`MarginEngine`]. Settlement computes the
//! full payout before touching the engine, so a failed computation delegates
//! nothing.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use note_core::codec::{instrument_id, serialize, ExtendedInstrument, Instrument};
use note_core::types::{BarrierId, InstrumentId};
use tracing::info;

use crate::breach::{BreachEvaluator, InstrumentObserver};
use crate::directory::AssetDirectory;
use crate::error::{Result, SettlementError};
use crate::options::{OptionPayoff, VanillaOptionPayoff};
use crate::oracle::{BreachReporter, PriceOracle, PriceSnapshot};
use crate::payout::{termination, ComponentPayout, PayoutCalculator, PayoutTarget};
use crate::registry::InstrumentRegistry;
use crate::SettlementConfig;

/// Custody boundary receiving settled instruments and payouts.
pub trait MarginEngine: Send + Sync {
    /// Removes `amount` units of instrument `id` from `account`.
    fn burn(&self, account: &str, id: &InstrumentId, amount: u128) -> Result<()>;

    /// Credits `payouts` to `account` through engine `engine_id`.
    fn route(&self, account: &str, engine_id: u8, payouts: &[ComponentPayout]) -> Result<()>;

    /// Routes `payouts` and burns the settled units.
    ///
    /// The provided implementation routes first and burns only once routing
    /// succeeded, so a routing failure leaves the holding untouched.
    /// Engines able to apply both steps under one lock should override it.
    fn settle(
        &self,
        account: &str,
        id: &InstrumentId,
        amount: u128,
        engine_id: u8,
        payouts: &[ComponentPayout],
    ) -> Result<()> {
        self.route(account, engine_id, payouts)?;
        self.burn(account, id, amount)
    }
}

/// One recorded burn.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BurnRecord {
    /// Account burned from.
    pub account: String,
    /// Instrument burned.
    pub instrument: InstrumentId,
    /// Units burned.
    pub amount: u128,
}

/// Accumulated balance of one target routed through one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreditRecord {
    /// Engine the payouts were routed through.
    pub engine_id: u8,
    /// Credited asset or token.
    pub target: PayoutTarget,
    /// Balance.
    pub amount: u128,
}

type CreditKey = (String, u8, PayoutTarget);

/// In-memory [`MarginEngine`] recording burns and accumulated credits.
///
/// Credits are kept per account, engine and target.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    burns: RwLock<Vec<BurnRecord>>,
    credits: RwLock<BTreeMap<CreditKey, u128>>,
}

impl RecordingEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// All burns in order.
    pub fn burns(&self) -> Vec<BurnRecord> {
        self.burns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Accumulated credit of `target` for `account` through `engine_id`.
    pub fn credit(&self, account: &str, engine_id: u8, target: PayoutTarget) -> u128 {
        self.credits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(account.to_string(), engine_id, target))
            .copied()
            .unwrap_or(0)
    }

    /// All credits of `account`, ordered by engine then target.
    pub fn credits(&self, account: &str) -> Vec<CreditRecord> {
        self.credits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((owner, _, _), _)| owner == account)
            .map(|((_, engine_id, target), amount)| CreditRecord {
                engine_id: *engine_id,
                target: *target,
                amount: *amount,
            })
            .collect()
    }

    /// New balances after crediting `payouts`, or an overflow error.
    fn credited(
        credits: &BTreeMap<CreditKey, u128>,
        account: &str,
        engine_id: u8,
        payouts: &[ComponentPayout],
    ) -> Result<Vec<(CreditKey, u128)>> {
        let mut updated: Vec<(CreditKey, u128)> = Vec::with_capacity(payouts.len());
        for payout in payouts {
            let key = (account.to_string(), engine_id, payout.target);
            let pending = updated
                .iter()
                .rev()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v);
            let current = pending.unwrap_or_else(|| credits.get(&key).copied().unwrap_or(0));
            let next = current
                .checked_add(payout.amount)
                .ok_or(SettlementError::Overflow("credit balance"))?;
            updated.push((key, next));
        }
        Ok(updated)
    }
}

impl MarginEngine for RecordingEngine {
    fn burn(&self, account: &str, id: &InstrumentId, amount: u128) -> Result<()> {
        self.burns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BurnRecord {
                account: account.to_string(),
                instrument: *id,
                amount,
            });
        Ok(())
    }

    fn route(&self, account: &str, engine_id: u8, payouts: &[ComponentPayout]) -> Result<()> {
        let mut credits = self.credits.write().unwrap_or_else(PoisonError::into_inner);
        let updated = Self::credited(&credits, account, engine_id, payouts)?;
        credits.extend(updated);
        Ok(())
    }

    fn settle(
        &self,
        account: &str,
        id: &InstrumentId,
        amount: u128,
        engine_id: u8,
        payouts: &[ComponentPayout],
    ) -> Result<()> {
        // lock order: credits, then burns
        let mut credits = self.credits.write().unwrap_or_else(PoisonError::into_inner);
        let updated = Self::credited(&credits, account, engine_id, payouts)?;
        let mut burns = self.burns.write().unwrap_or_else(PoisonError::into_inner);
        credits.extend(updated);
        burns.push(BurnRecord {
            account: account.to_string(),
            instrument: *id,
            amount,
        });
        Ok(())
    }
}

/// Registry plus collaborators.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use note_core::codec::ExtendedInstrument;
/// use note_settlement::directory::InMemoryDirectory;
/// use note_settlement::oracle::InMemoryOracle;
/// use note_settlement::{RecordingEngine, SettlementConfig, SettlementService};
///
/// let oracle = Arc::new(InMemoryOracle::new(0));
/// let service = SettlementService::new(
///     oracle.clone(),
///     oracle,
///     Arc::new(InMemoryDirectory::new()),
///     Arc::new(RecordingEngine::new()),
///     SettlementConfig::default(),
/// );
///
/// let extended = ExtendedInstrument {
///     oracle_id: 0,
///     engine_id: 0,
///     underlying_id: 1,
///     strike_id: 2,
///     collateral_id: 2,
///     expiry: 2_000,
///     period: 1_000,
///     autocall: None,
///     coupons: vec![],
///     options: vec![],
/// };
/// let id = service.register_instrument(&extended).unwrap();
/// assert_eq!(service.instrument_id(&extended).unwrap(), id);
/// ```
pub struct SettlementService {
    registry: InstrumentRegistry,
    oracle: Arc<dyn PriceOracle>,
    reporter: Arc<dyn BreachReporter>,
    directory: Arc<dyn AssetDirectory>,
    payoff: Arc<dyn OptionPayoff>,
    engine: Arc<dyn MarginEngine>,
    config: SettlementConfig,
}

impl SettlementService {
    /// Creates a service with an empty registry and the vanilla option payoff.
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        reporter: Arc<dyn BreachReporter>,
        directory: Arc<dyn AssetDirectory>,
        engine: Arc<dyn MarginEngine>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            registry: InstrumentRegistry::new(),
            oracle,
            reporter,
            directory,
            payoff: Arc::new(VanillaOptionPayoff),
            engine,
            config,
        }
    }

    /// Replaces the option payoff collaborator.
    pub fn with_option_payoff(mut self, payoff: Arc<dyn OptionPayoff>) -> Self {
        self.payoff = payoff;
        self
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Underlying registry.
    #[inline]
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// Registers a user-facing description.
    pub fn register_instrument(&self, extended: &ExtendedInstrument) -> Result<InstrumentId> {
        self.registry.register(extended)
    }

    /// Registers a compact instrument.
    pub fn register_compact(&self, instrument: Instrument) -> Result<InstrumentId> {
        self.registry.register_compact(instrument)
    }

    /// Fingerprint of a description, registered or not.
    pub fn instrument_id(&self, extended: &ExtendedInstrument) -> Result<InstrumentId> {
        Ok(instrument_id(&serialize(extended)?))
    }

    /// Registered instrument.
    pub fn instrument(&self, id: &InstrumentId) -> Result<Arc<Instrument>> {
        self.registry.get(id)
    }

    /// Breach record of a barrier on a registered instrument.
    pub fn barrier_breaches(&self, id: &InstrumentId, barrier_id: BarrierId) -> Result<Vec<u64>> {
        BreachEvaluator::new(
            &self.registry,
            self.oracle.as_ref(),
            self.reporter.as_ref(),
            self.config,
        )
        .barrier_breaches(id, barrier_id)
    }

    /// Termination time of a registered instrument.
    pub fn termination(&self, id: &InstrumentId) -> Result<u64> {
        let instrument = self.registry.get(id)?;
        let snapshot = PriceSnapshot::new(
            self.oracle.as_ref(),
            self.reporter.as_ref(),
            instrument.oracle_id,
            self.config.require_final_prices,
        );
        termination(&InstrumentObserver::new(*id, &instrument, &snapshot))
    }

    /// Per-component payouts without settling.
    pub fn instrument_payout(
        &self,
        id: &InstrumentId,
        settlement_amount: u128,
    ) -> Result<Vec<ComponentPayout>> {
        PayoutCalculator::new(
            &self.registry,
            self.oracle.as_ref(),
            self.reporter.as_ref(),
            self.directory.as_ref(),
            self.payoff.as_ref(),
            self.config,
        )
        .instrument_payout(id, settlement_amount)
    }

    /// Settles `settlement_amount` units of `id` held by `account`.
    ///
    /// The payout is computed and the engine resolved first. Routing and the
    /// burn are then handed to [`MarginEngine::settle`], so a failed routing
    /// burns nothing.
    pub fn settle_instrument(
        &self,
        account: &str,
        id: &InstrumentId,
        settlement_amount: u128,
    ) -> Result<Vec<ComponentPayout>> {
        let payouts = self.instrument_payout(id, settlement_amount)?;
        let instrument = self.registry.get(id)?;
        let engine = self.directory.engine(instrument.engine_id)?;

        self.engine
            .settle(account, id, settlement_amount, instrument.engine_id, &payouts)?;
        info!(
            instrument = %id,
            account,
            amount = settlement_amount,
            engine = %engine.name,
            components = payouts.len(),
            "Instrument settled"
        );
        Ok(payouts)
    }
}
