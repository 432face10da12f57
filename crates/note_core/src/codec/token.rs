//! Vanilla option token layout.
//!
//! An option leg refers to its option through an opaque [`TokenRef`]. This
//! module defines the layout understood by the bundled vanilla payoff:
//!
//! | bytes   | field                        |
//! |---------|------------------------------|
//! | 0       | kind (1 = call, 2 = put)     |
//! | 1       | underlying asset id          |
//! | 2       | strike asset id              |
//! | 3       | collateral asset id          |
//! | 4..12   | expiry (big-endian seconds)  |
//! | 12..20  | strike (big-endian, UNIT)    |
//! | 20..32  | reserved, zero               |

use std::fmt;
use std::str::FromStr;

use crate::types::{CodecError, TokenRef};

/// Type of option payoff.
///
/// # Variants
/// - `Call`: max(S - K, 0)
/// - `Put`: max(K - S, 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OptionKind {
    /// Call option: max(S - K, 0)
    Call,
    /// Put option: max(K - S, 0)
    Put,
}

impl OptionKind {
    /// Wire code of this kind.
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            OptionKind::Call => 1,
            OptionKind::Put => 2,
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            1 => Ok(OptionKind::Call),
            2 => Ok(OptionKind::Put),
            other => Err(CodecError::InvalidOptionKind(other)),
        }
    }

    /// Intrinsic value for the given spot and strike, floored at zero.
    ///
    /// # Examples
    /// ```
    /// use note_core::codec::OptionKind;
    ///
    /// assert_eq!(OptionKind::Call.intrinsic(110, 100), 10);
    /// assert_eq!(OptionKind::Put.intrinsic(110, 100), 0);
    /// ```
    #[inline]
    pub fn intrinsic(&self, spot: u128, strike: u128) -> u128 {
        match self {
            OptionKind::Call => spot.saturating_sub(strike),
            OptionKind::Put => strike.saturating_sub(spot),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Call => f.write_str("call"),
            OptionKind::Put => f.write_str("put"),
        }
    }
}

impl FromStr for OptionKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(OptionKind::Call),
            "put" | "p" => Ok(OptionKind::Put),
            _ => Err(CodecError::InvalidParameter {
                message: format!("Unknown option kind: {}", s),
            }),
        }
    }
}

/// Decoded vanilla option token.
///
/// # Examples
/// ```
/// use note_core::codec::{OptionKind, OptionToken};
///
/// let token = OptionToken {
///     kind: OptionKind::Put,
///     underlying_id: 1,
///     strike_id: 2,
///     collateral_id: 2,
///     expiry: 1_700_000_000,
///     strike: 1_800_000_000,
/// };
/// let reference = token.encode();
/// assert_eq!(OptionToken::decode(&reference).unwrap(), token);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionToken {
    /// Payoff kind.
    pub kind: OptionKind,
    /// Underlying asset id.
    pub underlying_id: u8,
    /// Strike asset id.
    pub strike_id: u8,
    /// Asset the payout is paid in.
    pub collateral_id: u8,
    /// Expiry timestamp.
    pub expiry: u64,
    /// Strike price at `UNIT_DECIMALS`.
    pub strike: u64,
}

impl OptionToken {
    /// Packs the token into its reference.
    pub fn encode(&self) -> TokenRef {
        let mut bytes = [0u8; 32];
        bytes[0] = self.kind.code();
        bytes[1] = self.underlying_id;
        bytes[2] = self.strike_id;
        bytes[3] = self.collateral_id;
        bytes[4..12].copy_from_slice(&self.expiry.to_be_bytes());
        bytes[12..20].copy_from_slice(&self.strike.to_be_bytes());
        TokenRef::from_bytes(bytes)
    }

    /// Unpacks a token reference.
    ///
    /// # Errors
    /// `InvalidOptionKind` for an unknown kind byte, `MalformedToken` when the
    /// reserved bytes are not zero.
    pub fn decode(token: &TokenRef) -> Result<Self, CodecError> {
        let bytes = token.as_bytes();
        if bytes[20..].iter().any(|b| *b != 0) {
            return Err(CodecError::MalformedToken(format!(
                "reserved bytes set in {}",
                token
            )));
        }
        let mut expiry = [0u8; 8];
        expiry.copy_from_slice(&bytes[4..12]);
        let mut strike = [0u8; 8];
        strike.copy_from_slice(&bytes[12..20]);
        Ok(Self {
            kind: OptionKind::from_code(bytes[0])?,
            underlying_id: bytes[1],
            strike_id: bytes[2],
            collateral_id: bytes[3],
            expiry: u64::from_be_bytes(expiry),
            strike: u64::from_be_bytes(strike),
        })
    }
}
