//! Settlement configuration.

/// Default dispute window of the in-memory price store, in seconds.
pub const DEFAULT_DISPUTE_PERIOD_SECS: u64 = 3_600;

/// Settlement behaviour knobs.
///
/// Deserialises from a TOML `[settlement]` table; missing keys keep their
/// defaults.
///
/// # Examples
/// ```
/// use note_settlement::SettlementConfig;
///
/// let config = SettlementConfig::default();
/// assert!(config.require_final_prices);
/// assert_eq!(config.dispute_period_secs, 3_600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SettlementConfig {
    /// Reject prices still inside their dispute window.
    pub require_final_prices: bool,
    /// Dispute window applied by [`crate::oracle::InMemoryOracle`].
    pub dispute_period_secs: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            require_final_prices: true,
            dispute_period_secs: DEFAULT_DISPUTE_PERIOD_SECS,
        }
    }
}

impl SettlementConfig {
    /// Configuration accepting disputable prices, for previews.
    pub fn preview() -> Self {
        Self {
            require_final_prices: false,
            ..Self::default()
        }
    }
}
