//! Content-addressed instrument registry.
//!
//! Instruments are stored under their fingerprint, at most once, and are
//! never updated or removed. Records are shared as `Arc<Instrument>` so a
//! reader keeps a stable copy for the whole of its computation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use note_core::codec::{
    decode_barrier, serialize, Autocall, Coupon, ExtendedInstrument, Instrument, OptionLeg,
};
use note_core::types::{InstrumentId, TriggerType};
use tracing::info;

use crate::error::{Result, SettlementError};

/// Thread-safe registry of immutable instruments.
///
/// # Examples
/// ```
/// use note_core::codec::{ExtendedInstrument};
/// use note_settlement::{InstrumentRegistry, SettlementError};
///
/// let registry = InstrumentRegistry::new();
/// let extended = ExtendedInstrument {
///     oracle_id: 0,
///     engine_id: 0,
///     underlying_id: 1,
///     strike_id: 2,
///     collateral_id: 2,
///     expiry: 1_000_000,
///     period: 86_400,
///     autocall: None,
///     coupons: vec![],
///     options: vec![],
/// };
///
/// let id = registry.register(&extended).unwrap();
/// assert!(registry.contains(&id));
/// assert_eq!(registry.register(&extended), Err(SettlementError::AlreadyRegistered(id)));
/// ```
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    instruments: RwLock<HashMap<InstrumentId, Arc<Instrument>>>,
}

impl InstrumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialises and registers a user-facing description.
    ///
    /// # Errors
    /// Codec errors from serialisation, role errors (see
    /// [`register_compact`](Self::register_compact)), `AlreadyRegistered`.
    pub fn register(&self, extended: &ExtendedInstrument) -> Result<InstrumentId> {
        let instrument = serialize(extended)?;
        self.register_compact(instrument)
    }

    /// Registers a compact instrument.
    ///
    /// Checks structure, then barrier roles: the autocall barrier must use the
    /// `Autocall` trigger and option barriers must be knock-in or knock-out.
    /// The duplicate check and insert happen under one write lock, so of two
    /// concurrent registrations of the same id exactly one succeeds.
    pub fn register_compact(&self, instrument: Instrument) -> Result<InstrumentId> {
        instrument.validate()?;
        check_roles(&instrument)?;

        let id = instrument.id();
        let mut instruments = self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match instruments.entry(id) {
            Entry::Occupied(_) => Err(SettlementError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                info!(
                    instrument = %id,
                    expiry = instrument.expiry,
                    period = instrument.period,
                    options = instrument.options.len(),
                    "Instrument registered"
                );
                slot.insert(Arc::new(instrument));
                Ok(id)
            }
        }
    }

    /// Registered record for `id`.
    ///
    /// # Errors
    /// `NotRegistered` if absent.
    pub fn get(&self, id: &InstrumentId) -> Result<Arc<Instrument>> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or(SettlementError::NotRegistered(*id))
    }

    /// Returns whether `id` is registered.
    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Number of registered instruments.
    pub fn len(&self) -> usize {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<_> = self
            .instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Decoded autocall of a registered instrument.
    pub fn autocall(&self, id: &InstrumentId) -> Result<Option<Autocall>> {
        Ok(self.get(id)?.autocall()?)
    }

    /// Decoded non-empty coupon slots of a registered instrument.
    pub fn coupons(&self, id: &InstrumentId) -> Result<Vec<(usize, Coupon)>> {
        Ok(self.get(id)?.coupon_slots()?)
    }

    /// Populated option legs of a registered instrument.
    pub fn options(&self, id: &InstrumentId) -> Result<Vec<OptionLeg>> {
        Ok(self
            .get(id)?
            .option_slots()
            .map(|(_, leg)| *leg)
            .collect())
    }
}

fn check_roles(instrument: &Instrument) -> Result<()> {
    if let Some(autocall) = instrument.autocall()? {
        let barrier = decode_barrier(autocall.barrier_id)?;
        if barrier.trigger != TriggerType::Autocall {
            return Err(SettlementError::Structural(format!(
                "autocall barrier {:#010x} has trigger {}",
                autocall.barrier_id, barrier.trigger
            )));
        }
    }
    for (slot, leg) in instrument.option_slots() {
        if leg.barrier_id == 0 {
            continue;
        }
        let barrier = decode_barrier(leg.barrier_id)?;
        if !barrier.trigger.is_knock() {
            return Err(SettlementError::Structural(format!(
                "option slot {} barrier {:#010x} has trigger {}",
                slot, leg.barrier_id, barrier.trigger
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::codec::{Barrier, ExtendedAutocall, ExtendedOption};
    use note_core::types::{ObservationFrequency, TokenRef};

    fn plain() -> ExtendedInstrument {
        ExtendedInstrument {
            oracle_id: 0,
            engine_id: 0,
            underlying_id: 1,
            strike_id: 2,
            collateral_id: 2,
            expiry: 10_000_000,
            period: 360 * 86_400,
            autocall: None,
            coupons: vec![],
            options: vec![],
        }
    }

    fn barrier(trigger: TriggerType) -> Barrier {
        Barrier::new(9_000, ObservationFrequency::OneMonth, trigger).unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let registry = InstrumentRegistry::new();
        assert!(registry.is_empty());

        let id = registry.register(&plain()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().id(), id);
        assert_eq!(registry.ids(), vec![id]);
    }

    #[test]
    fn test_duplicate_rejected_and_first_kept() {
        let registry = InstrumentRegistry::new();
        let id = registry.register(&plain()).unwrap();
        let first = registry.get(&id).unwrap();

        assert_eq!(
            registry.register(&plain()),
            Err(SettlementError::AlreadyRegistered(id))
        );
        assert!(Arc::ptr_eq(&first, &registry.get(&id).unwrap()));
    }

    #[test]
    fn test_not_registered() {
        let registry = InstrumentRegistry::new();
        let id = InstrumentId::from_bytes([3u8; 32]);
        assert_eq!(registry.get(&id), Err(SettlementError::NotRegistered(id)));
        assert!(registry.autocall(&id).is_err());
    }

    #[test]
    fn test_autocall_role_enforced() {
        let registry = InstrumentRegistry::new();
        let mut extended = plain();
        extended.autocall = Some(ExtendedAutocall {
            is_reverse: false,
            barrier: barrier(TriggerType::KnockOut),
        });
        assert!(matches!(
            registry.register(&extended),
            Err(SettlementError::Structural(_))
        ));

        extended.autocall = Some(ExtendedAutocall {
            is_reverse: false,
            barrier: barrier(TriggerType::Autocall),
        });
        let id = registry.register(&extended).unwrap();
        assert!(registry.autocall(&id).unwrap().is_some());
    }

    #[test]
    fn test_option_role_enforced() {
        let registry = InstrumentRegistry::new();
        let mut extended = plain();
        extended.options = vec![ExtendedOption {
            participation_pct: 10_000,
            barrier: Some(barrier(TriggerType::Autocall)),
            token: TokenRef::from_bytes([1u8; 32]),
        }];
        assert!(matches!(
            registry.register(&extended),
            Err(SettlementError::Structural(_))
        ));
        assert!(registry.is_empty());

        extended.options[0].barrier = Some(barrier(TriggerType::KnockIn));
        let id = registry.register(&extended).unwrap();
        assert_eq!(registry.options(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        let registry = Arc::new(InstrumentRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(&plain()))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SettlementError::AlreadyRegistered(_))));
        assert_eq!(registry.len(), 1);
    }
}
