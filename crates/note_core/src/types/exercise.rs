//! Barrier exercise discipline and trigger role.

use std::fmt;
use std::str::FromStr;

use super::error::CodecError;

/// When a barrier is observed.
///
/// # Variants
/// - `European`: a single observation at expiry
/// - `Continuous`: monitored at every instant; the first crossing is reported
///   by an external reporter
/// - `Discrete`: observed on a fixed schedule between creation and expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExerciseType {
    /// Single observation at expiry.
    European,
    /// Continuous monitoring.
    Continuous,
    /// Scheduled observations.
    Discrete,
}

impl ExerciseType {
    /// Wire code of this exercise type.
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(ExerciseType::European),
            1 => Ok(ExerciseType::Continuous),
            2 => Ok(ExerciseType::Discrete),
            other => Err(CodecError::InvalidExerciseType(other)),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExerciseType::European => "european",
            ExerciseType::Continuous => "continuous",
            ExerciseType::Discrete => "discrete",
        };
        f.write_str(name)
    }
}

/// The role a barrier plays when it is breached.
///
/// # Variants
/// - `Autocall`: terminates the instrument early
/// - `KnockOut`: deactivates the owning option
/// - `KnockIn`: activates the owning option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerType {
    /// Early termination trigger.
    Autocall,
    /// Option is cancelled once breached.
    KnockOut,
    /// Option only pays once breached.
    KnockIn,
}

impl TriggerType {
    /// Wire code of this trigger type.
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(TriggerType::Autocall),
            1 => Ok(TriggerType::KnockOut),
            2 => Ok(TriggerType::KnockIn),
            other => Err(CodecError::InvalidTriggerType(other)),
        }
    }

    /// Returns whether this trigger gates an option (knock-in or knock-out).
    #[inline]
    pub fn is_knock(&self) -> bool {
        matches!(self, TriggerType::KnockOut | TriggerType::KnockIn)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerType::Autocall => "autocall",
            TriggerType::KnockOut => "knock_out",
            TriggerType::KnockIn => "knock_in",
        };
        f.write_str(name)
    }
}

impl FromStr for TriggerType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "autocall" => Ok(TriggerType::Autocall),
            "knockout" | "ko" => Ok(TriggerType::KnockOut),
            "knockin" | "ki" => Ok(TriggerType::KnockIn),
            _ => Err(CodecError::InvalidParameter {
                message: format!("Unknown trigger type: {}", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_codes() {
        for ex in [
            ExerciseType::European,
            ExerciseType::Continuous,
            ExerciseType::Discrete,
        ] {
            assert_eq!(ExerciseType::from_code(ex.code()).unwrap(), ex);
        }
        assert_eq!(
            ExerciseType::from_code(3),
            Err(CodecError::InvalidExerciseType(3))
        );
    }

    #[test]
    fn test_trigger_codes() {
        for trigger in [TriggerType::Autocall, TriggerType::KnockOut, TriggerType::KnockIn] {
            assert_eq!(TriggerType::from_code(trigger.code()).unwrap(), trigger);
        }
        assert_eq!(
            TriggerType::from_code(9),
            Err(CodecError::InvalidTriggerType(9))
        );
    }

    #[test]
    fn test_trigger_parse() {
        assert_eq!("knock-in".parse::<TriggerType>().unwrap(), TriggerType::KnockIn);
        assert_eq!("KO".parse::<TriggerType>().unwrap(), TriggerType::KnockOut);
        assert!("knock-sideways".parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_is_knock() {
        assert!(!TriggerType::Autocall.is_knock());
        assert!(TriggerType::KnockOut.is_knock());
        assert!(TriggerType::KnockIn.is_knock());
    }
}
