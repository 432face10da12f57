//! Barrier encode/decode commands

use std::str::FromStr;

use note_core::codec::{decode_barrier, encode_barrier};
use note_core::types::{BarrierId, ObservationFrequency, TriggerType};
use serde::Serialize;

use super::{print_json, Context};
use crate::config::OutputFormat;
use crate::scenario::parse_barrier_id;
use crate::Result;

/// Decoded barrier as printed by the CLI
#[derive(Debug, Serialize)]
pub struct BarrierView {
    /// Packed id as hex
    pub id: String,
    /// Threshold (10_000 = 100%)
    pub threshold_pct: u16,
    /// Observation frequency
    pub frequency: ObservationFrequency,
    /// Trigger role
    pub trigger: TriggerType,
    /// Exercise discipline
    pub exercise: String,
}

impl BarrierView {
    fn from_id(id: BarrierId) -> Result<Self> {
        let barrier = decode_barrier(id)?;
        Ok(Self {
            id: format!("0x{:08x}", id),
            threshold_pct: barrier.threshold_pct,
            frequency: barrier.frequency,
            trigger: barrier.trigger,
            exercise: barrier.exercise().to_string(),
        })
    }
}

/// Run the encode-barrier command
pub fn encode(context: &Context, pct: u16, frequency: &str, trigger: &str) -> Result<()> {
    let frequency = ObservationFrequency::from_str(frequency)?;
    let trigger = TriggerType::from_str(trigger)?;
    let id = encode_barrier(pct, frequency, trigger)?;
    print(context, &BarrierView::from_id(id)?)
}

/// Run the decode-barrier command
pub fn decode(context: &Context, id: &str) -> Result<()> {
    let id = parse_barrier_id(id)?;
    print(context, &BarrierView::from_id(id)?)
}

fn print(context: &Context, view: &BarrierView) -> Result<()> {
    match context.format() {
        OutputFormat::Json => print_json(view),
        OutputFormat::Table => {
            println!("Barrier {}", view.id);
            println!("  Threshold:  {:.2}%", f64::from(view.threshold_pct) / 100.0);
            println!("  Frequency:  {}", view.frequency);
            println!("  Trigger:    {}", view.trigger);
            println!("  Exercise:   {}", view.exercise);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_id() {
        let id = encode_barrier(8_000, ObservationFrequency::OneMonth, TriggerType::KnockIn).unwrap();
        let view = BarrierView::from_id(id).unwrap();
        assert_eq!(view.threshold_pct, 8_000);
        assert_eq!(view.frequency, ObservationFrequency::OneMonth);
        assert_eq!(view.id, format!("0x{:08x}", id));
    }

    #[test]
    fn test_view_rejects_invalid_id() {
        assert!(BarrierView::from_id(0).is_err());
    }
}
