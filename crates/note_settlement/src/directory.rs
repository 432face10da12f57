//! Asset and margin-engine directory.
//!
//! Maps the `u8` identifiers carried by instruments to asset metadata
//! (symbol, decimals) and engine names. Payout amounts are computed at
//! `UNIT_DECIMALS` and converted to the paying asset's decimals through
//! [`convert_decimals`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{Result, SettlementError};

/// Asset metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetInfo {
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimals amounts in this asset carry.
    pub decimals: u8,
}

/// Margin engine metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineInfo {
    /// Engine name.
    pub name: String,
}

/// Lookup of asset and engine identifiers.
pub trait AssetDirectory: Send + Sync {
    /// Metadata of asset `id`.
    ///
    /// # Errors
    /// `UnknownAsset` if unset.
    fn asset(&self, id: u8) -> Result<AssetInfo>;

    /// Metadata of engine `id`.
    ///
    /// # Errors
    /// `UnknownEngine` if unset.
    fn engine(&self, id: u8) -> Result<EngineInfo>;
}

/// Thread-safe in-memory [`AssetDirectory`].
///
/// # Examples
/// ```
/// use note_settlement::directory::{AssetDirectory, InMemoryDirectory};
///
/// let directory = InMemoryDirectory::new();
/// directory.set_asset(1, "USDC", 6);
/// assert_eq!(directory.asset(1).unwrap().decimals, 6);
/// assert!(directory.asset(2).is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    assets: RwLock<HashMap<u8, AssetInfo>>,
    engines: RwLock<HashMap<u8, EngineInfo>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) asset `id`.
    pub fn set_asset(&self, id: u8, symbol: impl Into<String>, decimals: u8) {
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                AssetInfo {
                    symbol: symbol.into(),
                    decimals,
                },
            );
    }

    /// Sets (or replaces) engine `id`.
    pub fn set_engine(&self, id: u8, name: impl Into<String>) {
        self.engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, EngineInfo { name: name.into() });
    }
}

impl AssetDirectory for InMemoryDirectory {
    fn asset(&self, id: u8) -> Result<AssetInfo> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(SettlementError::UnknownAsset(id))
    }

    fn engine(&self, id: u8) -> Result<EngineInfo> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(SettlementError::UnknownEngine(id))
    }
}

/// Rescales `amount` from `from` decimals to `to` decimals.
///
/// Scaling down truncates. Scaling up uses checked arithmetic.
///
/// # Errors
/// `Overflow` if scaling up overflows `u128`.
///
/// # Examples
/// ```
/// use note_settlement::directory::convert_decimals;
///
/// assert_eq!(convert_decimals(1_500_000, 6, 18).unwrap(), 1_500_000_000_000_000_000);
/// assert_eq!(convert_decimals(1_999_999, 6, 0).unwrap(), 1);
/// ```
pub fn convert_decimals(amount: u128, from: u8, to: u8) -> Result<u128> {
    use std::cmp::Ordering;

    match from.cmp(&to) {
        Ordering::Equal => Ok(amount),
        Ordering::Less => 10u128
            .checked_pow(u32::from(to - from))
            .and_then(|scale| amount.checked_mul(scale))
            .ok_or(SettlementError::Overflow("decimal conversion")),
        Ordering::Greater => Ok(10u128
            .checked_pow(u32::from(from - to))
            .map_or(0, |scale| amount / scale)),
    }
}
