//! Breach record command

use note_core::codec::decode_barrier;
use note_core::types::InstrumentId;
use serde::Serialize;

use super::{format_timestamp, print_json, print_rule, Context};
use crate::config::OutputFormat;
use crate::scenario::resolve_barrier;
use crate::Result;

/// Breach record as printed by the CLI
#[derive(Debug, Serialize)]
pub struct BreachReport {
    /// Instrument id
    pub instrument: InstrumentId,
    /// Packed barrier id as hex
    pub barrier: String,
    /// One entry per observation; 0 = not breached
    pub breaches: Vec<u64>,
}

/// Run the breaches command
pub fn run(context: &Context, name: &str, target: &str) -> Result<()> {
    let loaded = context.load()?;
    let id = loaded.instrument_id(name)?;
    let instrument = loaded.service.instrument(&id)?;
    let barrier_id = resolve_barrier(&instrument, target)?;
    let breaches = loaded.service.barrier_breaches(&id, barrier_id)?;

    let report = BreachReport {
        instrument: id,
        barrier: format!("0x{:08x}", barrier_id),
        breaches,
    };

    match context.format() {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            let barrier = decode_barrier(barrier_id)?;
            println!(
                "{} barrier {} ({:.2}% {} {})",
                name,
                report.barrier,
                f64::from(barrier.threshold_pct) / 100.0,
                barrier.frequency,
                barrier.trigger
            );
            print_rule(40);
            println!("{:<6} {:<30}", "Obs", "Breached at");
            print_rule(40);
            for (k, timestamp) in report.breaches.iter().enumerate() {
                println!("{:<6} {:<30}", k + 1, format_timestamp(*timestamp));
            }
            print_rule(40);
            let count = report.breaches.iter().filter(|t| **t != 0).count();
            println!("{} of {} observations breached", count, report.breaches.len());
            Ok(())
        }
    }
}
