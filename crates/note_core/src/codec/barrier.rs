//! Barrier definition and its 32-bit packed form.
//!
//! Layout (most significant first):
//!
//! | bits    | field            |
//! |---------|------------------|
//! | 31..16  | threshold pct    |
//! | 15..8   | frequency code   |
//! | 7..4    | trigger code     |
//! | 3..0    | exercise code    |
//!
//! The exercise code is derived from the frequency on encode and checked
//! against it on decode.

use super::bits::BitField;
use crate::types::{BarrierId, CodecError, ExerciseType, ObservationFrequency, TriggerType};

const PCT: BitField = BitField::new("threshold_pct", 16, 16);
const FREQUENCY: BitField = BitField::new("frequency", 8, 8);
const TRIGGER: BitField = BitField::new("trigger", 4, 4);
const EXERCISE: BitField = BitField::new("exercise", 0, 4);

/// A price-relative threshold with an observation discipline and a role.
///
/// `threshold_pct` is two-decimal fixed point relative to the initial spot
/// (`10_000` = 100%). Below 100% the barrier is a downside level, above 100%
/// an upside level.
///
/// # Examples
/// ```
/// use note_core::codec::Barrier;
/// use note_core::types::{ExerciseType, ObservationFrequency, TriggerType};
///
/// let barrier = Barrier::new(6_500, ObservationFrequency::None, TriggerType::KnockIn).unwrap();
/// assert_eq!(barrier.exercise(), ExerciseType::European);
/// assert!(barrier.is_downside());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Barrier {
    /// Threshold relative to the initial spot (10_000 = 100%).
    pub threshold_pct: u16,
    /// Observation schedule.
    pub frequency: ObservationFrequency,
    /// Role played on breach.
    pub trigger: TriggerType,
}

impl Barrier {
    /// Creates a barrier, rejecting a zero threshold.
    pub fn new(
        threshold_pct: u16,
        frequency: ObservationFrequency,
        trigger: TriggerType,
    ) -> Result<Self, CodecError> {
        if threshold_pct == 0 {
            return Err(CodecError::ZeroThreshold);
        }
        Ok(Self {
            threshold_pct,
            frequency,
            trigger,
        })
    }

    /// Exercise discipline derived from the frequency.
    #[inline]
    pub fn exercise(&self) -> ExerciseType {
        self.frequency.exercise()
    }

    /// Returns whether a breach means the price fell below the threshold.
    #[inline]
    pub fn is_downside(&self) -> bool {
        u128::from(self.threshold_pct) < crate::types::PERCENT_SCALE
    }

    /// Packs this barrier into its identifier.
    pub fn encode(&self) -> Result<BarrierId, CodecError> {
        encode_barrier(self.threshold_pct, self.frequency, self.trigger)
    }
}

/// Packs barrier fields into a barrier id.
///
/// # Errors
/// `ZeroThreshold` if `threshold_pct` is 0 (id 0 is reserved for "no barrier").
pub fn encode_barrier(
    threshold_pct: u16,
    frequency: ObservationFrequency,
    trigger: TriggerType,
) -> Result<BarrierId, CodecError> {
    if threshold_pct == 0 {
        return Err(CodecError::ZeroThreshold);
    }
    let word = PCT.pack(u64::from(threshold_pct))?
        | FREQUENCY.pack(u64::from(frequency.code()))?
        | TRIGGER.pack(u64::from(trigger.code()))?
        | EXERCISE.pack(u64::from(frequency.exercise().code()))?;
    // 32 bits by construction
    Ok(word as BarrierId)
}

/// Unpacks a barrier id.
///
/// # Errors
/// - `ZeroThreshold` for a word with a 0% threshold (including id 0)
/// - `InvalidFrequency` / `InvalidTriggerType` / `InvalidExerciseType` for
///   unknown codes
/// - `ExerciseMismatch` when the stored exercise code disagrees with the
///   frequency
pub fn decode_barrier(id: BarrierId) -> Result<Barrier, CodecError> {
    let word = u64::from(id);
    let threshold_pct = PCT.unpack(word) as u16;
    if threshold_pct == 0 {
        return Err(CodecError::ZeroThreshold);
    }
    let frequency_code = FREQUENCY.unpack(word) as u8;
    let exercise_code = EXERCISE.unpack(word) as u8;
    let frequency = ObservationFrequency::from_code(frequency_code)?;
    let trigger = TriggerType::from_code(TRIGGER.unpack(word) as u8)?;
    let exercise = ExerciseType::from_code(exercise_code)?;
    if exercise != frequency.exercise() {
        return Err(CodecError::ExerciseMismatch {
            frequency: frequency_code,
            stored: exercise_code,
        });
    }
    Ok(Barrier {
        threshold_pct,
        frequency,
        trigger,
    })
}

/// Unpacks a barrier id where 0 means "no barrier".
pub fn decode_optional_barrier(id: BarrierId) -> Result<Option<Barrier>, CodecError> {
    if id == 0 {
        return Ok(None);
    }
    decode_barrier(id).map(Some)
}

/// Extracts the raw exercise code without validating the rest of the word.
#[inline]
pub fn exercise_code(id: BarrierId) -> u8 {
    EXERCISE.unpack(u64::from(id)) as u8
}
