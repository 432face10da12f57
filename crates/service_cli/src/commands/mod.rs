//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. Shared helpers for
//! scenario loading, amount parsing and output formatting live here.

pub mod barrier;
pub mod breaches;
pub mod check;
pub mod instrument;
pub mod payout;
pub mod settle;

use std::path::PathBuf;

use chrono::DateTime;
use note_core::types::{UNIT, UNIT_DECIMALS};
use note_settlement::directory::AssetDirectory;
use note_settlement::{PayoutTarget, SettlementConfig};
use serde::Serialize;

use crate::config::{CliConfig, OutputFormat};
use crate::scenario::{LoadedScenario, Scenario};
use crate::{CliError, Result};

/// Scenario file used when neither the CLI nor the config names one
pub const DEFAULT_SCENARIO: &str = "note.toml";

/// Resolved configuration shared by every command
pub struct Context {
    /// Effective configuration
    pub config: CliConfig,
}

impl Context {
    /// Wraps a resolved configuration
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Scenario file path
    pub fn scenario_path(&self) -> PathBuf {
        self.config
            .scenario
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIO))
    }

    /// Parses the scenario file without building services
    pub fn scenario(&self) -> Result<Scenario> {
        Scenario::from_file(&self.scenario_path())
    }

    /// Loads the scenario with the configured settlement behaviour
    pub fn load(&self) -> Result<LoadedScenario> {
        self.load_with(self.config.settlement)
    }

    /// Loads the scenario with explicit settlement behaviour
    pub fn load_with(&self, settlement: SettlementConfig) -> Result<LoadedScenario> {
        self.scenario()?.build(settlement)
    }

    /// Active output format
    pub fn format(&self) -> OutputFormat {
        self.config.output_format
    }
}

/// Parses a decimal unit amount ("10", "2.5") into base units.
pub fn parse_units(text: &str) -> Result<u128> {
    let text = text.trim().replace('_', "");
    let invalid = || CliError::invalid_argument(format!("invalid amount: {}", text));

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text.as_str(), ""),
    };
    if fraction.len() > usize::from(UNIT_DECIMALS) || (whole.is_empty() && fraction.is_empty()) {
        return Err(invalid());
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let scale = 10u128.pow(u32::from(UNIT_DECIMALS) - fraction.len() as u32);
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        fraction.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(fraction * scale))
        .ok_or_else(invalid)
}

/// Formats a base-unit amount with `decimals` fractional digits.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals));
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = usize::from(decimals)
    )
}

/// Formats a payout amount in the paying asset's decimals and symbol.
///
/// Option tokens carry `UNIT_DECIMALS`; unknown assets print raw.
pub fn format_payout(directory: &dyn AssetDirectory, target: &PayoutTarget, amount: u128) -> String {
    match target {
        PayoutTarget::Collateral(id) => match directory.asset(*id) {
            Ok(asset) => format!("{} {}", format_amount(amount, asset.decimals), asset.symbol),
            Err(_) => amount.to_string(),
        },
        PayoutTarget::Token(_) => format_amount(amount, UNIT_DECIMALS),
    }
}

/// Formats a Unix timestamp as UTC, or `-` for 0.
pub fn format_timestamp(timestamp: u64) -> String {
    if timestamp == 0 {
        return "-".to_string();
    }
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Shortens a 0x-prefixed hex string for table output.
pub fn short_hex(hex: &str) -> String {
    if hex.len() <= 18 {
        return hex.to_string();
    }
    format!("{}..{}", &hex[..10], &hex[hex.len() - 6..])
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a horizontal rule sized for table output.
pub fn print_rule(width: usize) {
    println!("{}", "-".repeat(width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::types::TokenRef;
    use note_settlement::directory::InMemoryDirectory;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("10").unwrap(), 10_000_000);
        assert_eq!(parse_units("2.5").unwrap(), 2_500_000);
        assert_eq!(parse_units("0.000001").unwrap(), 1);
        assert_eq!(parse_units(".5").unwrap(), 500_000);
        assert_eq!(parse_units("1_000").unwrap(), 1_000_000_000);
        assert!(parse_units("0.0000001").is_err());
        assert!(parse_units("abc").is_err());
        assert!(parse_units("-1").is_err());
        assert!(parse_units(".").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(40_000_000, 6), "40.000000");
        assert_eq!(format_amount(1, 6), "0.000001");
        assert_eq!(format_amount(7, 0), "7");
        assert_eq!(format_amount(1_234, 2), "12.34");
    }

    #[test]
    fn test_format_payout_uses_directory() {
        let directory = InMemoryDirectory::new();
        directory.set_asset(2, "USDC", 6);
        assert_eq!(
            format_payout(&directory, &PayoutTarget::Collateral(2), 1_500_000),
            "1.500000 USDC"
        );
        assert_eq!(
            format_payout(&directory, &PayoutTarget::Collateral(9), 15),
            "15"
        );
        assert_eq!(
            format_payout(&directory, &PayoutTarget::Token(TokenRef::ZERO), 2_000_000),
            "2.000000"
        );
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "-");
        assert_eq!(format_timestamp(86_400), "1970-01-02 00:00:00 UTC");
    }

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex("0x1234"), "0x1234");
        let long = format!("0x{}", "ab".repeat(32));
        assert_eq!(short_hex(&long), "0xabababab..ababab");
    }

    #[test]
    fn test_context_default_scenario() {
        let context = Context::new(CliConfig::default());
        assert_eq!(context.scenario_path(), PathBuf::from(DEFAULT_SCENARIO));
    }
}
