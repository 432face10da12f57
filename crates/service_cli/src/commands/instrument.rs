//! Instrument fingerprint and registration commands

use note_core::codec::{serialize, Instrument};
use note_core::types::InstrumentId;
use serde::Serialize;
use tracing::info;

use super::{format_timestamp, print_json, print_rule, short_hex, Context};
use crate::config::OutputFormat;
use crate::{CliError, Result};

/// Instrument summary as printed by the CLI
#[derive(Debug, Serialize)]
pub struct InstrumentView {
    /// Scenario name
    pub name: String,
    /// Content-addressed id
    pub id: InstrumentId,
    /// Compact stored form
    pub instrument: Instrument,
}

/// Run the id command: fingerprint declarations without registering them
pub fn run_id(context: &Context, name: Option<&str>) -> Result<()> {
    let scenario = context.scenario()?;
    let mut views = Vec::new();
    for spec in &scenario.instruments {
        if name.is_some_and(|n| n != spec.name) {
            continue;
        }
        let instrument = serialize(&spec.to_extended())?;
        views.push(InstrumentView {
            name: spec.name.clone(),
            id: instrument.id(),
            instrument,
        });
    }
    if let (Some(name), true) = (name, views.is_empty()) {
        return Err(CliError::UnknownInstrument(name.to_string()));
    }
    print_views(context, &views)
}

/// Run the register command: register every scenario instrument
pub fn run_register(context: &Context) -> Result<()> {
    let loaded = context.load()?;
    let mut views = Vec::with_capacity(loaded.instruments().len());
    for (name, id) in loaded.instruments() {
        let instrument = loaded.service.instrument(id)?;
        views.push(InstrumentView {
            name: name.clone(),
            id: *id,
            instrument: instrument.as_ref().clone(),
        });
    }
    info!(count = views.len(), "Instruments registered");
    print_views(context, &views)
}

fn print_views(context: &Context, views: &[InstrumentView]) -> Result<()> {
    if context.format() == OutputFormat::Json {
        return print_json(&views);
    }

    print_rule(100);
    println!(
        "{:<16} {:<20} {:<24} {:<24} {:>6} {:>6}",
        "Name", "Id", "Creation", "Expiry", "Cpns", "Opts"
    );
    print_rule(100);
    for view in views {
        let coupons = view.instrument.coupon_slots()?.len();
        let options = view.instrument.option_slots().count();
        println!(
            "{:<16} {:<20} {:<24} {:<24} {:>6} {:>6}",
            view.name,
            short_hex(&view.id.to_hex()),
            format_timestamp(view.instrument.creation()),
            format_timestamp(view.instrument.expiry),
            coupons,
            options
        );
    }
    print_rule(100);

    for view in views {
        println!();
        println!("{} = {}", view.name, view.id);
        if view.instrument.autocall_id != 0 {
            println!("  autocall  0x{:016x}", view.instrument.autocall_id);
        }
        if !view.instrument.coupons.is_empty() {
            println!("  coupons   {}", view.instrument.coupons);
        }
        for (slot, leg) in view.instrument.option_slots() {
            println!(
                "  option {}  {:>5} bps  barrier 0x{:08x}  {}",
                slot, leg.participation_pct, leg.barrier_id, leg.token
            );
        }
    }
    Ok(())
}
