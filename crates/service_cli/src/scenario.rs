//! Scenario files
//!
//! A scenario is a TOML document describing the world a command runs
//! against: the oracle clock, asset and engine directories, reported prices,
//! continuous breach reports and named instruments.
//!
//! ```toml
//! [clock]
//! now = 1_011_000_000
//!
//! [[assets]]
//! id = 1
//! symbol = "XYZ"
//! decimals = 6
//!
//! [[engines]]
//! id = 0
//! name = "cross-margin"
//!
//! [[prices]]
//! base = 1
//! quote = 2
//! timestamp = 1_000_000
//! price = 100_000_000
//!
//! [[instruments]]
//! name = "phoenix"
//! # ... extended instrument fields
//! ```
//!
//! Timestamps accept Unix seconds or RFC 3339 / `YYYY-MM-DD` strings.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use note_core::codec::{
    ExtendedAutocall, ExtendedCoupon, ExtendedInstrument, ExtendedOption, Instrument, OptionToken,
};
use note_core::types::{BarrierId, InstrumentId, TokenRef};
use note_settlement::directory::InMemoryDirectory;
use note_settlement::oracle::{InMemoryOracle, PriceFeed};
use note_settlement::{RecordingEngine, SettlementConfig, SettlementService};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// A timestamp written as Unix seconds or as a date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unix(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Unix(secs) => Ok(Timestamp(secs)),
            Raw::Text(text) => parse_timestamp(&text)
                .map(Timestamp)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Parses Unix seconds, an RFC 3339 date-time or a `YYYY-MM-DD` date (UTC
/// midnight).
pub fn parse_timestamp(text: &str) -> Result<u64> {
    let text = text.trim().replace('_', "");
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(secs);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(&text) {
        return u64::try_from(datetime.timestamp())
            .map_err(|_| CliError::invalid_argument(format!("timestamp before 1970: {}", text)));
    }
    let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|_| CliError::invalid_argument(format!("unrecognised timestamp: {}", text)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::invalid_argument(format!("invalid date: {}", text)))?;
    u64::try_from(midnight.and_utc().timestamp())
        .map_err(|_| CliError::invalid_argument(format!("timestamp before 1970: {}", text)))
}

/// Oracle clock.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockSpec {
    /// Oracle time after replay; defaults to the latest reported event.
    pub now: Option<Timestamp>,
}

/// Asset directory entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSpec {
    /// Asset id
    pub id: u8,
    /// Ticker symbol
    pub symbol: String,
    /// Token decimals
    pub decimals: u8,
}

/// Engine directory entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSpec {
    /// Engine id
    pub id: u8,
    /// Engine name
    pub name: String,
}

/// One reported price.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSpec {
    /// Oracle id
    #[serde(default)]
    pub oracle: u8,
    /// Base asset id
    pub base: u8,
    /// Quote asset id
    pub quote: u8,
    /// Observation timestamp
    pub timestamp: Timestamp,
    /// Price at six decimals
    pub price: u64,
    /// When the price was written; defaults to `timestamp`
    #[serde(default)]
    pub reported_at: Option<Timestamp>,
}

impl PriceSpec {
    fn feed(&self) -> PriceFeed {
        PriceFeed {
            oracle_id: self.oracle,
            base: self.base,
            quote: self.quote,
        }
    }

    fn reported_at(&self) -> u64 {
        self.reported_at.unwrap_or(self.timestamp).0
    }
}

/// A continuous-breach report against a named instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct BreachSpec {
    /// Instrument name
    pub instrument: String,
    /// Barrier target, see [`resolve_barrier`]
    pub barrier: String,
    /// First breach timestamp
    pub timestamp: Timestamp,
}

/// Option token written either as raw hex or as vanilla terms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenSpec {
    /// `0x`-prefixed 32-byte token reference
    Raw(TokenRef),
    /// Vanilla option terms, encoded on load
    Vanilla(OptionToken),
}

impl TokenSpec {
    fn token_ref(&self) -> TokenRef {
        match self {
            TokenSpec::Raw(token) => *token,
            TokenSpec::Vanilla(terms) => terms.encode(),
        }
    }
}

/// Option leg of a scenario instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionSpec {
    /// Participation (10_000 = 100%)
    pub participation_pct: u16,
    /// Knock barrier
    #[serde(default)]
    pub barrier: Option<note_core::codec::Barrier>,
    /// Option token
    pub token: TokenSpec,
}

/// A named instrument in extended form.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSpec {
    /// Scenario-local name
    pub name: String,
    /// Price oracle id
    #[serde(default)]
    pub oracle_id: u8,
    /// Margin engine id
    #[serde(default)]
    pub engine_id: u8,
    /// Underlying asset id
    pub underlying_id: u8,
    /// Strike asset id
    pub strike_id: u8,
    /// Coupon collateral asset id
    pub collateral_id: u8,
    /// Maturity
    pub expiry: Timestamp,
    /// Life in seconds
    pub period: u64,
    /// Autocall
    #[serde(default)]
    pub autocall: Option<ExtendedAutocall>,
    /// Coupons
    #[serde(default)]
    pub coupons: Vec<ExtendedCoupon>,
    /// Option legs
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

impl InstrumentSpec {
    /// Extended description understood by the settlement layer.
    pub fn to_extended(&self) -> ExtendedInstrument {
        ExtendedInstrument {
            oracle_id: self.oracle_id,
            engine_id: self.engine_id,
            underlying_id: self.underlying_id,
            strike_id: self.strike_id,
            collateral_id: self.collateral_id,
            expiry: self.expiry.0,
            period: self.period,
            autocall: self.autocall,
            coupons: self.coupons.clone(),
            options: self
                .options
                .iter()
                .map(|o| ExtendedOption {
                    participation_pct: o.participation_pct,
                    barrier: o.barrier,
                    token: o.token.token_ref(),
                })
                .collect(),
        }
    }
}

/// Parsed scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Oracle clock
    pub clock: ClockSpec,
    /// Asset directory
    pub assets: Vec<AssetSpec>,
    /// Engine directory
    pub engines: Vec<EngineSpec>,
    /// Reported prices
    pub prices: Vec<PriceSpec>,
    /// Continuous breach reports
    pub breaches: Vec<BreachSpec>,
    /// Named instruments
    pub instruments: Vec<InstrumentSpec>,
}

/// Services built from a scenario.
pub struct LoadedScenario {
    /// Settlement facade
    pub service: SettlementService,
    /// Price store behind the facade
    pub oracle: Arc<InMemoryOracle>,
    /// Recording margin engine behind the facade
    pub engine: Arc<RecordingEngine>,
    /// Asset and engine directory behind the facade
    pub directory: Arc<InMemoryDirectory>,
    names: Vec<(String, InstrumentId)>,
}

impl LoadedScenario {
    /// Instrument id registered under `name`.
    pub fn instrument_id(&self, name: &str) -> Result<InstrumentId> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| CliError::UnknownInstrument(name.to_string()))
    }

    /// Registered instruments in declaration order.
    pub fn instruments(&self) -> &[(String, InstrumentId)] {
        &self.names
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses scenario TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::scenario(format!("invalid TOML: {}", e)))
    }

    /// Builds the settlement stack and replays every reported event.
    ///
    /// Prices are written in `reported_at` order with the oracle clock moved
    /// to each write time, so dispute windows run from the write and not
    /// from the observation.
    pub fn build(&self, config: SettlementConfig) -> Result<LoadedScenario> {
        let oracle = Arc::new(InMemoryOracle::new(config.dispute_period_secs));
        let directory = Arc::new(InMemoryDirectory::new());
        let engine = Arc::new(RecordingEngine::new());

        for asset in &self.assets {
            directory.set_asset(asset.id, asset.symbol.clone(), asset.decimals);
        }
        for spec in &self.engines {
            directory.set_engine(spec.id, spec.name.clone());
        }

        let service = SettlementService::new(
            oracle.clone(),
            oracle.clone(),
            directory.clone(),
            engine.clone(),
            config,
        );

        let mut names: Vec<(String, InstrumentId)> = Vec::with_capacity(self.instruments.len());
        for spec in &self.instruments {
            if names.iter().any(|(n, _)| *n == spec.name) {
                return Err(CliError::scenario(format!(
                    "duplicate instrument name: {}",
                    spec.name
                )));
            }
            let id = service.register_instrument(&spec.to_extended())?;
            debug!(name = %spec.name, instrument = %id, "Scenario instrument registered");
            names.push((spec.name.clone(), id));
        }

        let mut prices: Vec<&PriceSpec> = self.prices.iter().collect();
        prices.sort_by_key(|p| (p.reported_at(), p.timestamp));
        for price in prices {
            if price.reported_at() < price.timestamp.0 {
                return Err(CliError::scenario(format!(
                    "price for {} at {} reported before it was observed",
                    price.feed(),
                    price.timestamp.0
                )));
            }
            oracle.set_time(price.reported_at());
            oracle.report_price(price.feed(), price.timestamp.0, u128::from(price.price))?;
        }

        let loaded = LoadedScenario {
            service,
            oracle,
            engine,
            directory,
            names,
        };

        for breach in &self.breaches {
            let id = loaded.instrument_id(&breach.instrument)?;
            let instrument = loaded.service.instrument(&id)?;
            let barrier_id = resolve_barrier(&instrument, &breach.barrier)?;
            loaded.oracle.set_time(breach.timestamp.0);
            loaded
                .oracle
                .record_continuous_breach(id, barrier_id, breach.timestamp.0)?;
        }

        let latest = loaded.oracle.now();
        if let Some(now) = self.clock.now {
            if now.0 < latest {
                return Err(CliError::scenario(format!(
                    "clock.now {} precedes reported data at {}",
                    now.0, latest
                )));
            }
            loaded.oracle.set_time(now.0);
        }

        info!(
            instruments = loaded.names.len(),
            prices = loaded.oracle.len(),
            now = loaded.oracle.now(),
            "Scenario loaded"
        );
        Ok(loaded)
    }
}

/// Resolves a barrier target on a compact instrument.
///
/// Accepts `autocall`, `coupon:N`, `option:N` (slot indices) or a raw
/// barrier id in decimal or `0x` hex.
pub fn resolve_barrier(instrument: &Instrument, target: &str) -> Result<BarrierId> {
    let target = target.trim();
    let missing = || CliError::invalid_argument(format!("no barrier at {}", target));

    if target.eq_ignore_ascii_case("autocall") {
        return instrument
            .autocall()?
            .map(|a| a.barrier_id)
            .ok_or_else(missing);
    }
    if let Some(slot) = target.strip_prefix("coupon:") {
        let slot = parse_slot(slot)?;
        return instrument
            .coupon_slots()?
            .into_iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, c)| c.barrier_id)
            .filter(|id| *id != 0)
            .ok_or_else(missing);
    }
    if let Some(slot) = target.strip_prefix("option:") {
        let slot = parse_slot(slot)?;
        return instrument
            .option_slots()
            .find(|(s, _)| *s == slot)
            .map(|(_, leg)| leg.barrier_id)
            .filter(|id| *id != 0)
            .ok_or_else(missing);
    }
    parse_barrier_id(target)
}

/// Parses a barrier id in decimal or `0x` hex.
pub fn parse_barrier_id(text: &str) -> Result<BarrierId> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => BarrierId::from_str_radix(hex, 16),
        None => text.parse::<BarrierId>(),
    };
    parsed.map_err(|_| CliError::invalid_argument(format!("invalid barrier id: {}", text)))
}

fn parse_slot(text: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| CliError::invalid_argument(format!("invalid slot index: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_core::types::{ObservationFrequency, TriggerType};
    use note_settlement::SettlementError;

    const SCENARIO: &str = r#"
        [clock]
        now = 20_000_000

        [[assets]]
        id = 1
        symbol = "XYZ"
        decimals = 6

        [[assets]]
        id = 2
        symbol = "USDC"
        decimals = 6

        [[engines]]
        id = 0
        name = "cross-margin"

        [[prices]]
        base = 1
        quote = 2
        timestamp = 1_000_000
        price = 100_000_000

        [[prices]]
        base = 1
        quote = 2
        timestamp = 5_000_000
        price = 45_000_000

        [[prices]]
        base = 1
        quote = 2
        timestamp = 11_368_000
        price = 55_000_000
        reported_at = 11_400_000

        [[breaches]]
        instrument = "knockout"
        barrier = "option:0"
        timestamp = 5_000_000

        [[instruments]]
        name = "knockout"
        underlying_id = 1
        strike_id = 2
        collateral_id = 2
        expiry = 11_368_000
        period = 10_368_000

        [[instruments.options]]
        participation_pct = 10_000
        barrier = { threshold_pct = 5_000, frequency = "one_second", trigger = "knock_out" }
        token = { kind = "put", underlying_id = 1, strike_id = 2, collateral_id = 2, expiry = 11_368_000, strike = 100_000_000 }
    "#;

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("1_000").unwrap(), 1_000);
        assert_eq!(parse_timestamp("1970-01-02").unwrap(), 86_400);
        assert_eq!(parse_timestamp("1970-01-01T01:00:00Z").unwrap(), 3_600);
        assert!(parse_timestamp("1969-12-31").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_scenario_loads() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let loaded = scenario.build(SettlementConfig::default()).unwrap();

        assert_eq!(loaded.oracle.now(), 20_000_000);
        assert_eq!(loaded.oracle.len(), 3);
        assert_eq!(loaded.instruments().len(), 1);

        let id = loaded.instrument_id("knockout").unwrap();
        let instrument = loaded.service.instrument(&id).unwrap();
        let barrier = resolve_barrier(&instrument, "option:0").unwrap();
        assert_eq!(
            loaded.service.barrier_breaches(&id, barrier).unwrap(),
            vec![5_000_000]
        );
    }

    #[test]
    fn test_reported_breach_knocks_out() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let loaded = scenario.build(SettlementConfig::default()).unwrap();
        let id = loaded.instrument_id("knockout").unwrap();
        assert!(loaded
            .service
            .instrument_payout(&id, 1_000_000)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_late_report_is_not_final() {
        let mut scenario = Scenario::from_toml(SCENARIO).unwrap();
        scenario.clock.now = None;
        scenario.breaches.clear();
        let loaded = scenario.build(SettlementConfig::default()).unwrap();
        let id = loaded.instrument_id("knockout").unwrap();

        // the expiry price was written at 11_400_000 and the clock stops there
        let err = loaded.service.instrument_payout(&id, 1_000_000).unwrap_err();
        assert!(matches!(err, SettlementError::PriceNotFinal { .. }));
    }

    #[test]
    fn test_unknown_instrument_name() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let loaded = scenario.build(SettlementConfig::default()).unwrap();
        assert!(matches!(
            loaded.instrument_id("missing"),
            Err(CliError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut scenario = Scenario::from_toml(SCENARIO).unwrap();
        let mut copy = scenario.instruments[0].clone();
        copy.period += 1;
        scenario.instruments.push(copy);
        assert!(matches!(
            scenario.build(SettlementConfig::default()),
            Err(CliError::Scenario(_))
        ));
    }

    #[test]
    fn test_clock_cannot_rewind() {
        let mut scenario = Scenario::from_toml(SCENARIO).unwrap();
        scenario.clock.now = Some(Timestamp(2_000_000));
        assert!(matches!(
            scenario.build(SettlementConfig::default()),
            Err(CliError::Scenario(_))
        ));
    }

    #[test]
    fn test_resolve_barrier_targets() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let extended = scenario.instruments[0].to_extended();
        let instrument = note_core::codec::serialize(&extended).unwrap();

        let expected =
            note_core::codec::encode_barrier(5_000, ObservationFrequency::OneSecond, TriggerType::KnockOut)
                .unwrap();
        assert_eq!(resolve_barrier(&instrument, "option:0").unwrap(), expected);
        assert_eq!(
            resolve_barrier(&instrument, &format!("0x{:08x}", expected)).unwrap(),
            expected
        );
        assert_eq!(
            resolve_barrier(&instrument, &expected.to_string()).unwrap(),
            expected
        );
        assert!(resolve_barrier(&instrument, "autocall").is_err());
        assert!(resolve_barrier(&instrument, "coupon:0").is_err());
        assert!(resolve_barrier(&instrument, "option:x").is_err());
    }

    #[test]
    fn test_demo_scenario_payouts() {
        let scenario =
            Scenario::from_toml(include_str!("../../../demo/notes/phoenix_autocall.toml")).unwrap();
        let loaded = scenario.build(SettlementConfig::default()).unwrap();

        let phoenix = loaded.instrument_id("phoenix").unwrap();
        let amounts: Vec<u128> = loaded
            .service
            .instrument_payout(&phoenix, 10_000_000)
            .unwrap()
            .iter()
            .map(|p| p.amount)
            .collect();
        assert_eq!(amounts, vec![60_000_000, 450_000_000]);

        let protected = loaded.instrument_id("protected").unwrap();
        let payouts = loaded
            .service
            .instrument_payout(&protected, 10_000_000)
            .unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].amount, 50_000_000);
    }

    #[test]
    fn test_raw_token_form() {
        let token = OptionToken {
            kind: note_core::codec::OptionKind::Call,
            underlying_id: 1,
            strike_id: 2,
            collateral_id: 2,
            expiry: 500,
            strike: 1,
        }
        .encode();
        let text = format!(
            "participation_pct = 5000\ntoken = \"{}\"\n",
            token.to_hex()
        );
        let spec: OptionSpec = toml::from_str(&text).unwrap();
        assert_eq!(spec.token.token_ref(), token);
    }
}
