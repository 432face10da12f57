//! Coupon definition, its 64-bit packed form, and the four-slot packed field.
//!
//! Coupon layout (most significant first):
//!
//! | bits    | field          |
//! |---------|----------------|
//! | 63..48  | coupon pct     |
//! | 47..36  | installments   |
//! | 35..32  | coupon type    |
//! | 31..0   | barrier id     |

use std::fmt;
use std::str::FromStr;

use super::barrier::decode_barrier;
use super::bits::BitField;
use crate::types::{BarrierId, CodecError, CouponId, MAX_COUPONS};

const PCT: BitField = BitField::new("coupon_pct", 48, 16);
const INSTALLMENTS: BitField = BitField::new("installments", 36, 12);
const TYPE: BitField = BitField::new("coupon_type", 32, 4);
const BARRIER: BitField = BitField::new("barrier_id", 0, 32);

/// Rule deciding how many installments of a coupon are paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CouponType {
    /// Pays once per breached observation.
    None,
    /// Pays for every non-breached observation (usually no barrier at all).
    Fixed,
    /// Pays for every non-breached observation.
    Phoenix,
    /// Pays up to the latest non-breached observation, recalling missed coupons.
    PhoenixMemory,
    /// Single coupon opportunity at the last observation.
    Vanilla,
}

impl CouponType {
    /// Wire code of this coupon type.
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(CouponType::None),
            1 => Ok(CouponType::Fixed),
            2 => Ok(CouponType::Phoenix),
            3 => Ok(CouponType::PhoenixMemory),
            4 => Ok(CouponType::Vanilla),
            other => Err(CodecError::InvalidCouponType(other)),
        }
    }
}

impl fmt::Display for CouponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CouponType::None => "none",
            CouponType::Fixed => "fixed",
            CouponType::Phoenix => "phoenix",
            CouponType::PhoenixMemory => "phoenix_memory",
            CouponType::Vanilla => "vanilla",
        };
        f.write_str(name)
    }
}

impl FromStr for CouponType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "none" => Ok(CouponType::None),
            "fixed" => Ok(CouponType::Fixed),
            "phoenix" => Ok(CouponType::Phoenix),
            "phoenixmemory" | "memory" => Ok(CouponType::PhoenixMemory),
            "vanilla" => Ok(CouponType::Vanilla),
            _ => Err(CodecError::InvalidParameter {
                message: format!("Unknown coupon type: {}", s),
            }),
        }
    }
}

/// A periodic payment conditioned on barrier observations.
///
/// # Examples
/// ```
/// use note_core::codec::{decode_coupon, encode_coupon, CouponType};
///
/// let id = encode_coupon(250, 4, CouponType::Phoenix, 0).unwrap();
/// let coupon = decode_coupon(id).unwrap();
/// assert_eq!(coupon.coupon_pct, 250);
/// assert_eq!(coupon.installments, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coupon {
    /// Coupon rate relative to the initial spot (10_000 = 100%).
    pub coupon_pct: u16,
    /// Number of installments the coupon is split into.
    pub installments: u16,
    /// Payment rule.
    pub coupon_type: CouponType,
    /// Packed barrier id (0 = unconditional).
    pub barrier_id: BarrierId,
}

impl Coupon {
    /// Packs this coupon into its identifier.
    pub fn encode(&self) -> Result<CouponId, CodecError> {
        encode_coupon(
            self.coupon_pct,
            self.installments,
            self.coupon_type,
            self.barrier_id,
        )
    }
}

/// Packs coupon fields into a coupon id.
///
/// A non-zero `barrier_id` must itself decode.
///
/// # Errors
/// `FieldOutOfRange` if `installments` exceeds 12 bits; any barrier decode
/// error for a malformed `barrier_id`.
pub fn encode_coupon(
    coupon_pct: u16,
    installments: u16,
    coupon_type: CouponType,
    barrier_id: BarrierId,
) -> Result<CouponId, CodecError> {
    if barrier_id != 0 {
        decode_barrier(barrier_id)?;
    }
    Ok(PCT.pack(u64::from(coupon_pct))?
        | INSTALLMENTS.pack(u64::from(installments))?
        | TYPE.pack(u64::from(coupon_type.code()))?
        | BARRIER.pack(u64::from(barrier_id))?)
}

/// Unpacks a coupon id.
pub fn decode_coupon(id: CouponId) -> Result<Coupon, CodecError> {
    Ok(Coupon {
        coupon_pct: PCT.unpack(id) as u16,
        installments: INSTALLMENTS.unpack(id) as u16,
        coupon_type: CouponType::from_code(TYPE.unpack(id) as u8)?,
        barrier_id: BARRIER.unpack(id) as BarrierId,
    })
}

/// Four coupon words packed into one 256-bit value, slot 0 most significant.
///
/// Stored as four 64-bit limbs in big-endian limb order, so limb `i` is
/// exactly the 256-bit value shifted right by `(MAX_COUPONS - i - 1) * 64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedCoupons([u64; MAX_COUPONS]);

impl PackedCoupons {
    /// No coupons.
    pub const EMPTY: Self = Self([0; MAX_COUPONS]);

    /// Wraps four coupon words.
    #[inline]
    pub const fn from_words(words: [u64; MAX_COUPONS]) -> Self {
        Self(words)
    }

    /// Returns the four coupon words.
    #[inline]
    pub const fn words(&self) -> &[u64; MAX_COUPONS] {
        &self.0
    }

    /// Big-endian 256-bit representation.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Parses a big-endian 256-bit representation.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut words = [0u64; MAX_COUPONS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(chunk);
            *word = u64::from_be_bytes(limb);
        }
        Self(words)
    }

    /// Returns whether every slot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// `0x`-prefixed 64-digit hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }
}

impl fmt::Display for PackedCoupons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PackedCoupons {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim().trim_start_matches("0x")).map_err(|e| {
            CodecError::InvalidParameter {
                message: format!("PackedCoupons: {}", e),
            }
        })?;
        let bytes: [u8; 32] = raw.try_into().map_err(|v: Vec<u8>| CodecError::InvalidParameter {
            message: format!("PackedCoupons: expected 32 bytes, got {}", v.len()),
        })?;
        Ok(Self::from_be_bytes(bytes))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PackedCoupons {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PackedCoupons {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Folds up to four coupon words into the packed field, in slot order.
///
/// # Errors
/// `TooManyCoupons` for more than four words.
pub fn get_coupons(coupons: &[CouponId]) -> Result<PackedCoupons, CodecError> {
    if coupons.len() > MAX_COUPONS {
        return Err(CodecError::TooManyCoupons(coupons.len()));
    }
    let mut words = [0u64; MAX_COUPONS];
    words[..coupons.len()].copy_from_slice(coupons);
    Ok(PackedCoupons(words))
}

/// Extracts the coupon word at `index`.
///
/// # Errors
/// `SlotOutOfRange` if `index >= 4`.
pub fn parse_coupon_at(packed: &PackedCoupons, index: usize) -> Result<CouponId, CodecError> {
    packed
        .0
        .get(index)
        .copied()
        .ok_or(CodecError::SlotOutOfRange {
            index,
            capacity: MAX_COUPONS,
        })
}
