//! 256-bit identifier newtypes.
//!
//! Both identifiers are opaque 32-byte values displayed and parsed as
//! `0x`-prefixed lowercase hex.

use std::fmt;
use std::str::FromStr;

use super::error::CodecError;

macro_rules! word256 {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; 32]);

        impl $name {
            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; 32]);

            /// Wraps raw big-endian bytes.
            #[inline]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Returns the raw big-endian bytes.
            #[inline]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Returns whether every byte is zero.
            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            /// Lowercase hex with a `0x` prefix.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            /// Parses 64 hex digits, with or without a `0x` prefix.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.trim().trim_start_matches("0x");
                let raw = hex::decode(digits).map_err(|e| CodecError::InvalidParameter {
                    message: format!("{}: {}", stringify!($name), e),
                })?;
                let bytes: [u8; 32] = raw.try_into().map_err(|v: Vec<u8>| {
                    CodecError::InvalidParameter {
                        message: format!("{}: expected 32 bytes, got {}", stringify!($name), v.len()),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

word256!(
    /// Content-addressed fingerprint of an instrument.
    ///
    /// Produced by [`crate::codec::instrument_id`]; used as the registry key.
    InstrumentId
);

word256!(
    /// Opaque 256-bit reference to an option token.
    ///
    /// The payout layer never interprets it directly; see
    /// [`crate::codec::OptionToken`] for the layout used by the bundled
    /// vanilla payoff.
    TokenRef
);
