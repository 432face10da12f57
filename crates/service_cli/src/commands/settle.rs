//! Settlement command
//!
//! Settles a holding against the scenario's recording engine and prints the
//! payouts together with the resulting account credits.

use note_core::types::InstrumentId;
use note_settlement::{ComponentPayout, CreditRecord};
use serde::Serialize;
use tracing::info;

use super::payout::print_payouts;
use super::{format_payout, parse_units, print_json, print_rule, Context};
use crate::config::OutputFormat;
use crate::Result;

/// Settlement result as printed by the CLI
#[derive(Debug, Serialize)]
pub struct SettleReport {
    /// Account settled
    pub account: String,
    /// Instrument id
    pub instrument: InstrumentId,
    /// Units burned, in base units
    pub burned: u128,
    /// Payouts routed
    pub payouts: Vec<ComponentPayout>,
    /// Account balances after routing
    pub credits: Vec<CreditRecord>,
}

/// Run the settle command
pub fn run(context: &Context, name: &str, account: &str, amount: &str) -> Result<()> {
    let amount = parse_units(amount)?;
    let loaded = context.load()?;
    let id = loaded.instrument_id(name)?;

    let payouts = loaded.service.settle_instrument(account, &id, amount)?;
    info!(instrument = name, account, "Settlement routed");

    let report = SettleReport {
        account: account.to_string(),
        instrument: id,
        burned: amount,
        payouts,
        credits: loaded.engine.credits(account),
    };

    match context.format() {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            println!("Settled {} for {}", name, account);
            print_payouts(&loaded, &report.payouts);
            println!();
            println!("Credits for {}", account);
            print_rule(72);
            for credit in &report.credits {
                println!(
                    "{:<6} {:<44} {:>20}",
                    credit.engine_id,
                    credit.target.to_string(),
                    format_payout(loaded.directory.as_ref(), &credit.target, credit.amount)
                );
            }
            print_rule(72);
            Ok(())
        }
    }
}
