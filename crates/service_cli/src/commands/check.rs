//! Check command
//!
//! Validates the effective configuration and the scenario file, and reports
//! instruments whose assets or engine are missing from the directory.

use note_settlement::directory::AssetDirectory;
use serde::Serialize;
use tracing::warn;

use super::{format_timestamp, print_json, Context};
use crate::config::OutputFormat;
use crate::Result;

/// Scenario health summary
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Scenario file checked
    pub scenario: String,
    /// Whether non-final prices are rejected
    pub require_final_prices: bool,
    /// Dispute window in seconds
    pub dispute_period_secs: u64,
    /// Oracle clock after replay
    pub now: u64,
    /// Stored prices
    pub prices: usize,
    /// Registered instruments
    pub instruments: usize,
    /// Missing directory entries
    pub problems: Vec<String>,
}

/// Run the check command
pub fn run(context: &Context) -> Result<()> {
    let loaded = context.load()?;
    let directory = loaded.directory.as_ref();

    let mut problems = Vec::new();
    for (name, id) in loaded.instruments() {
        let instrument = loaded.service.instrument(id)?;
        if directory.engine(instrument.engine_id).is_err() {
            problems.push(format!("{}: unknown engine {}", name, instrument.engine_id));
        }
        for asset in [
            instrument.underlying_id,
            instrument.strike_id,
            instrument.collateral_id,
        ] {
            if directory.asset(asset).is_err() {
                problems.push(format!("{}: unknown asset {}", name, asset));
            }
        }
    }
    problems.dedup();
    for problem in &problems {
        warn!(problem = %problem, "Scenario check");
    }

    let settlement = loaded.service.config();
    let report = CheckReport {
        scenario: context.scenario_path().display().to_string(),
        require_final_prices: settlement.require_final_prices,
        dispute_period_secs: settlement.dispute_period_secs,
        now: loaded.oracle.now(),
        prices: loaded.oracle.len(),
        instruments: loaded.instruments().len(),
        problems,
    };

    match context.format() {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            println!("Scenario:        {}", report.scenario);
            println!("Final prices:    {}", report.require_final_prices);
            println!("Dispute period:  {}s", report.dispute_period_secs);
            println!("Oracle clock:    {}", format_timestamp(report.now));
            println!("Prices:          {}", report.prices);
            println!("Instruments:     {}", report.instruments);
            if report.problems.is_empty() {
                println!("Status:          ok");
            } else {
                println!("Status:          {} problem(s)", report.problems.len());
                for problem in &report.problems {
                    println!("  - {}", problem);
                }
            }
            Ok(())
        }
    }
}
