//! Instrument descriptions and the content-addressed instrument fingerprint.
//!
//! Two forms exist:
//! - [`ExtendedInstrument`]: user-facing, with explicit [`Barrier`] structs per
//!   feature
//! - [`Instrument`]: compact stored form carrying packed identifiers
//!
//! [`serialize`] turns the first into the second; [`instrument_id`] hashes the
//! compact form.

use sha2::{Digest, Sha256};

use super::autocall::{decode_optional_autocall, encode_autocall, Autocall};
use super::barrier::{decode_optional_barrier, Barrier};
use super::coupon::{decode_coupon, encode_coupon, get_coupons, Coupon, CouponType, PackedCoupons};
use crate::types::{
    AutocallId, BarrierId, CodecError, InstrumentId, TokenRef, MAX_COUPONS, MAX_OPTIONS,
    MAX_PERIOD,
};

const DOMAIN: &[u8] = b"note-instrument/v1";

/// One option slot of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionLeg {
    /// Participation relative to the option payout (10_000 = 100%).
    pub participation_pct: u16,
    /// Packed barrier id (0 = no barrier).
    pub barrier_id: BarrierId,
    /// Option token reference.
    pub token: TokenRef,
}

impl OptionLeg {
    /// Returns whether this slot is unused (zero participation).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.participation_pct == 0
    }
}

/// Compact stored form of a structured instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instrument {
    /// Price oracle the instrument observes.
    pub oracle_id: u8,
    /// Margin engine settling the instrument.
    pub engine_id: u8,
    /// Underlying asset id.
    pub underlying_id: u8,
    /// Strike (quote) asset id.
    pub strike_id: u8,
    /// Asset coupons are paid in.
    pub collateral_id: u8,
    /// Maturity timestamp.
    pub expiry: u64,
    /// Life of the instrument in seconds; creation is `expiry - period`.
    pub period: u64,
    /// Packed autocall (0 = none).
    pub autocall_id: AutocallId,
    /// Four packed coupon slots.
    pub coupons: PackedCoupons,
    /// Up to four option legs.
    pub options: Vec<OptionLeg>,
}

impl Instrument {
    /// Creation timestamp, `expiry - period`.
    #[inline]
    pub fn creation(&self) -> u64 {
        self.expiry.saturating_sub(self.period)
    }

    /// Checks structural limits.
    ///
    /// - `0 < period <= min(expiry, MAX_PERIOD)`
    /// - at most four options, none empty
    /// - every non-zero barrier, coupon and autocall id decodes
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.period == 0 || self.period > self.expiry || self.period > MAX_PERIOD {
            return Err(CodecError::InvalidPeriod {
                period: self.period,
                expiry: self.expiry,
            });
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(CodecError::TooManyOptions(self.options.len()));
        }
        if let Some(autocall) = self.autocall()? {
            decode_optional_barrier(autocall.barrier_id)?;
        }
        for (_, coupon) in self.coupon_slots()? {
            decode_optional_barrier(coupon.barrier_id)?;
        }
        for (slot, leg) in self.options.iter().enumerate() {
            if leg.is_empty() {
                return Err(CodecError::InvalidParameter {
                    message: format!("option slot {} has zero participation", slot),
                });
            }
            decode_optional_barrier(leg.barrier_id)?;
        }
        Ok(())
    }

    /// Decoded autocall, if any.
    pub fn autocall(&self) -> Result<Option<Autocall>, CodecError> {
        decode_optional_autocall(self.autocall_id)
    }

    /// Non-empty coupon slots with their slot index.
    pub fn coupon_slots(&self) -> Result<Vec<(usize, Coupon)>, CodecError> {
        self.coupons
            .words()
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .map(|(slot, word)| decode_coupon(*word).map(|c| (slot, c)))
            .collect()
    }

    /// Populated option slots with their slot index, stopping at the first
    /// empty slot.
    pub fn option_slots(&self) -> impl Iterator<Item = (usize, &OptionLeg)> {
        self.options
            .iter()
            .enumerate()
            .take_while(|(_, leg)| !leg.is_empty())
    }

    /// Fingerprint of this instrument.
    #[inline]
    pub fn id(&self) -> InstrumentId {
        instrument_id(self)
    }
}

/// Computes the content-addressed fingerprint of an instrument.
///
/// The seed hashes every non-option field. Each option slot is then folded in
/// order as `H(prev || participation || barrier || token)`, stopping at the
/// first empty slot, so unused trailing slots never change the id.
///
/// # Examples
/// ```
/// use note_core::codec::{instrument_id, Instrument, PackedCoupons};
///
/// let instrument = Instrument {
///     oracle_id: 0,
///     engine_id: 1,
///     underlying_id: 2,
///     strike_id: 3,
///     collateral_id: 3,
///     expiry: 1_000_000,
///     period: 86_400,
///     autocall_id: 0,
///     coupons: PackedCoupons::EMPTY,
///     options: vec![],
/// };
/// assert_eq!(instrument_id(&instrument), instrument_id(&instrument.clone()));
/// ```
pub fn instrument_id(instrument: &Instrument) -> InstrumentId {
    let mut seed = Sha256::new();
    seed.update(DOMAIN);
    seed.update([
        instrument.oracle_id,
        instrument.engine_id,
        instrument.underlying_id,
        instrument.strike_id,
        instrument.collateral_id,
    ]);
    seed.update(instrument.expiry.to_be_bytes());
    seed.update(instrument.period.to_be_bytes());
    seed.update(instrument.autocall_id.to_be_bytes());
    seed.update(instrument.coupons.to_be_bytes());
    let mut hash: [u8; 32] = seed.finalize().into();

    for (_, leg) in instrument.option_slots() {
        let mut fold = Sha256::new();
        fold.update(hash);
        fold.update(leg.participation_pct.to_be_bytes());
        fold.update(leg.barrier_id.to_be_bytes());
        fold.update(leg.token.as_bytes());
        hash = fold.finalize().into();
    }

    InstrumentId::from_bytes(hash)
}

/// Autocall with an explicit barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedAutocall {
    /// Inverts the trigger condition.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_reverse: bool,
    /// Autocall barrier.
    pub barrier: Barrier,
}

/// Coupon with an explicit barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedCoupon {
    /// Coupon rate relative to the initial spot (10_000 = 100%).
    pub coupon_pct: u16,
    /// Number of installments.
    pub installments: u16,
    /// Payment rule.
    pub coupon_type: CouponType,
    /// Coupon barrier, if conditional.
    #[cfg_attr(feature = "serde", serde(default))]
    pub barrier: Option<Barrier>,
}

/// Option leg with an explicit barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedOption {
    /// Participation (10_000 = 100%); 0 marks an empty slot.
    pub participation_pct: u16,
    /// Knock-in / knock-out barrier, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub barrier: Option<Barrier>,
    /// Option token reference.
    pub token: TokenRef,
}

/// User-facing instrument description.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedInstrument {
    /// Price oracle the instrument observes.
    pub oracle_id: u8,
    /// Margin engine settling the instrument.
    pub engine_id: u8,
    /// Underlying asset id.
    pub underlying_id: u8,
    /// Strike (quote) asset id.
    pub strike_id: u8,
    /// Asset coupons are paid in.
    pub collateral_id: u8,
    /// Maturity timestamp.
    pub expiry: u64,
    /// Life of the instrument in seconds.
    pub period: u64,
    /// Optional autocall.
    #[cfg_attr(feature = "serde", serde(default))]
    pub autocall: Option<ExtendedAutocall>,
    /// Up to four coupons.
    #[cfg_attr(feature = "serde", serde(default))]
    pub coupons: Vec<ExtendedCoupon>,
    /// Up to four option slots; the first empty slot ends the list.
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: Vec<ExtendedOption>,
}

impl ExtendedInstrument {
    /// Fingerprint of the compact form.
    pub fn instrument_id(&self) -> Result<InstrumentId, CodecError> {
        serialize(self).map(|instrument| instrument_id(&instrument))
    }
}

/// Expands an extended description into the compact stored form.
///
/// Every sub-identifier is computed through the encoders. Options are
/// truncated at the first empty slot. The result is validated.
pub fn serialize(extended: &ExtendedInstrument) -> Result<Instrument, CodecError> {
    if extended.coupons.len() > MAX_COUPONS {
        return Err(CodecError::TooManyCoupons(extended.coupons.len()));
    }
    if extended.options.len() > MAX_OPTIONS {
        return Err(CodecError::TooManyOptions(extended.options.len()));
    }

    let autocall_id = match &extended.autocall {
        Some(autocall) => encode_autocall(autocall.is_reverse, autocall.barrier.encode()?)?,
        None => 0,
    };

    let coupon_words = extended
        .coupons
        .iter()
        .map(|c| {
            let barrier_id = c.barrier.map(|b| b.encode()).transpose()?.unwrap_or(0);
            encode_coupon(c.coupon_pct, c.installments, c.coupon_type, barrier_id)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = extended
        .options
        .iter()
        .take_while(|o| o.participation_pct != 0)
        .map(|o| {
            Ok(OptionLeg {
                participation_pct: o.participation_pct,
                barrier_id: o.barrier.map(|b| b.encode()).transpose()?.unwrap_or(0),
                token: o.token,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    let instrument = Instrument {
        oracle_id: extended.oracle_id,
        engine_id: extended.engine_id,
        underlying_id: extended.underlying_id,
        strike_id: extended.strike_id,
        collateral_id: extended.collateral_id,
        expiry: extended.expiry,
        period: extended.period,
        autocall_id,
        coupons: get_coupons(&coupon_words)?,
        options,
    };
    instrument.validate()?;
    Ok(instrument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::barrier::decode_barrier;
    use crate::types::{ObservationFrequency, TriggerType};

    fn token(seed: u8) -> TokenRef {
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        bytes[31] = seed;
        TokenRef::from_bytes(bytes)
    }

    fn extended() -> ExtendedInstrument {
        ExtendedInstrument {
            oracle_id: 1,
            engine_id: 2,
            underlying_id: 3,
            strike_id: 4,
            collateral_id: 4,
            expiry: 1_800_000_000,
            period: 360 * 86_400,
            autocall: Some(ExtendedAutocall {
                is_reverse: false,
                barrier: Barrier::new(
                    10_000,
                    ObservationFrequency::ThreeMonths,
                    TriggerType::Autocall,
                )
                .unwrap(),
            }),
            coupons: vec![ExtendedCoupon {
                coupon_pct: 200,
                installments: 4,
                coupon_type: CouponType::Phoenix,
                barrier: Some(
                    Barrier::new(7_000, ObservationFrequency::ThreeMonths, TriggerType::KnockOut)
                        .unwrap(),
                ),
            }],
            options: vec![ExtendedOption {
                participation_pct: 10_000,
                barrier: Some(
                    Barrier::new(6_000, ObservationFrequency::None, TriggerType::KnockIn).unwrap(),
                ),
                token: token(1),
            }],
        }
    }

    #[test]
    fn test_serialize_computes_sub_identifiers() {
        let instrument = serialize(&extended()).unwrap();
        let autocall = instrument.autocall().unwrap().unwrap();
        assert!(!autocall.is_reverse);
        assert_eq!(decode_barrier(autocall.barrier_id).unwrap().threshold_pct, 10_000);

        let coupons = instrument.coupon_slots().unwrap();
        assert_eq!(coupons.len(), 1);
        assert_eq!(coupons[0].0, 0);
        assert_eq!(coupons[0].1.coupon_type, CouponType::Phoenix);

        assert_eq!(instrument.options.len(), 1);
        assert_eq!(
            decode_barrier(instrument.options[0].barrier_id).unwrap().trigger,
            TriggerType::KnockIn
        );
    }

    #[test]
    fn test_serialize_truncates_at_first_empty_option() {
        let mut ext = extended();
        ext.options.push(ExtendedOption {
            participation_pct: 0,
            barrier: None,
            token: TokenRef::ZERO,
        });
        ext.options.push(ExtendedOption {
            participation_pct: 5_000,
            barrier: None,
            token: token(9),
        });
        let instrument = serialize(&ext).unwrap();
        assert_eq!(instrument.options.len(), 1);
    }

    #[test]
    fn test_serialize_rejects_too_many() {
        let mut ext = extended();
        ext.coupons = vec![ext.coupons[0]; 5];
        assert_eq!(serialize(&ext), Err(CodecError::TooManyCoupons(5)));

        let mut ext = extended();
        ext.options = vec![ext.options[0]; 5];
        assert_eq!(serialize(&ext), Err(CodecError::TooManyOptions(5)));
    }

    #[test]
    fn test_validate_period() {
        let mut ext = extended();
        ext.period = 0;
        assert!(matches!(serialize(&ext), Err(CodecError::InvalidPeriod { .. })));

        let mut ext = extended();
        ext.period = ext.expiry + 1;
        assert!(matches!(serialize(&ext), Err(CodecError::InvalidPeriod { .. })));

        let mut ext = extended();
        ext.expiry = u64::MAX;
        ext.period = MAX_PERIOD + 1;
        assert!(matches!(serialize(&ext), Err(CodecError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_id_is_deterministic() {
        let a = serialize(&extended()).unwrap();
        let b = serialize(&extended()).unwrap();
        assert_eq!(instrument_id(&a), instrument_id(&b));
        assert_eq!(extended().instrument_id().unwrap(), a.id());
    }

    #[test]
    fn test_id_changes_with_any_field() {
        let base = serialize(&extended()).unwrap();
        let base_id = base.id();

        let mut changed = base.clone();
        changed.engine_id += 1;
        assert_ne!(changed.id(), base_id);

        let mut changed = base.clone();
        changed.expiry += 1;
        assert_ne!(changed.id(), base_id);

        let mut changed = base.clone();
        changed.options[0].participation_pct += 1;
        assert_ne!(changed.id(), base_id);

        let mut changed = base.clone();
        changed.options[0].token = token(2);
        assert_ne!(changed.id(), base_id);

        let mut changed = base.clone();
        changed.coupons = PackedCoupons::EMPTY;
        assert_ne!(changed.id(), base_id);
    }

    #[test]
    fn test_trailing_empty_slots_do_not_change_id() {
        let base = serialize(&extended()).unwrap();
        let mut padded = base.clone();
        padded.options.extend(std::iter::repeat(OptionLeg {
            participation_pct: 0,
            barrier_id: 0,
            token: TokenRef::ZERO,
        }).take(3));
        assert_eq!(padded.id(), base.id());
    }

    #[test]
    fn test_option_order_matters() {
        let mut ext = extended();
        ext.options.push(ExtendedOption {
            participation_pct: 5_000,
            barrier: None,
            token: token(7),
        });
        let forward = serialize(&ext).unwrap().id();
        ext.options.reverse();
        let reversed = serialize(&ext).unwrap().id();
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_creation() {
        let instrument = serialize(&extended()).unwrap();
        assert_eq!(instrument.creation(), 1_800_000_000 - 360 * 86_400);
    }
}
