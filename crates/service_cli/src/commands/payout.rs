//! Payout preview command
//!
//! Computes per-component payouts without burning or routing anything.

use note_core::types::InstrumentId;
use note_settlement::ComponentPayout;
use serde::Serialize;

use super::{format_payout, format_timestamp, parse_units, print_json, print_rule, Context};
use crate::config::OutputFormat;
use crate::scenario::LoadedScenario;
use crate::Result;

/// Payout result as printed by the CLI
#[derive(Debug, Serialize)]
pub struct PayoutReport {
    /// Instrument id
    pub instrument: InstrumentId,
    /// Units settled, in base units
    pub settlement_amount: u128,
    /// Termination timestamp
    pub termination: u64,
    /// Non-zero components
    pub payouts: Vec<ComponentPayout>,
}

/// Run the payout command
pub fn run(context: &Context, name: &str, amount: &str, preview: bool) -> Result<()> {
    let amount = parse_units(amount)?;
    let mut settlement = context.config.settlement;
    if preview {
        settlement.require_final_prices = false;
    }
    let loaded = context.load_with(settlement)?;
    let id = loaded.instrument_id(name)?;

    let report = PayoutReport {
        instrument: id,
        settlement_amount: amount,
        termination: loaded.service.termination(&id)?,
        payouts: loaded.service.instrument_payout(&id, amount)?,
    };

    match context.format() {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            println!("{} ({})", name, id);
            println!("Terminates: {}", format_timestamp(report.termination));
            print_payouts(&loaded, &report.payouts);
            Ok(())
        }
    }
}

/// Prints a payout table.
pub(crate) fn print_payouts(loaded: &LoadedScenario, payouts: &[ComponentPayout]) {
    print_rule(72);
    println!("{:<8} {:<6} {:<28} {:>26}", "Kind", "Slot", "Target", "Amount");
    print_rule(72);
    if payouts.is_empty() {
        println!("(no payout)");
    }
    for payout in payouts {
        println!(
            "{:<8} {:<6} {:<28} {:>26}",
            payout.kind,
            payout.index,
            super::short_hex(&payout.target.to_string()),
            format_payout(loaded.directory.as_ref(), &payout.target, payout.amount)
        );
    }
    print_rule(72);
}
