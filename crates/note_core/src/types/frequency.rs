//! Barrier observation frequency enumeration.

use std::fmt;
use std::str::FromStr;

use super::error::CodecError;
use super::exercise::ExerciseType;

const DAY: u64 = 86_400;
const MONTH: u64 = 30 * DAY;

/// How often a barrier is observed.
///
/// Month-based frequencies assume 30 days per month and `OneYear` is 360 days,
/// the same convention used for day-count approximations elsewhere.
///
/// # Examples
///
/// ```
/// use note_core::types::{ExerciseType, ObservationFrequency};
///
/// let freq = ObservationFrequency::ThreeMonths;
/// assert_eq!(freq.seconds(), 90 * 86_400);
/// assert_eq!(freq.exercise(), ExerciseType::Discrete);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObservationFrequency {
    /// Observed once, at expiry.
    None,
    /// Monitored continuously.
    OneSecond,
    /// Daily observations.
    OneDay,
    /// Weekly observations.
    OneWeek,
    /// Fortnightly observations.
    TwoWeeks,
    /// Monthly observations.
    OneMonth,
    /// Bi-monthly observations.
    TwoMonths,
    /// Quarterly observations.
    ThreeMonths,
    /// Semi-annual observations.
    SixMonths,
    /// Observations every nine months.
    NineMonths,
    /// Annual observations.
    OneYear,
}

impl ObservationFrequency {
    /// All frequencies in code order.
    pub const ALL: [ObservationFrequency; 11] = [
        ObservationFrequency::None,
        ObservationFrequency::OneSecond,
        ObservationFrequency::OneDay,
        ObservationFrequency::OneWeek,
        ObservationFrequency::TwoWeeks,
        ObservationFrequency::OneMonth,
        ObservationFrequency::TwoMonths,
        ObservationFrequency::ThreeMonths,
        ObservationFrequency::SixMonths,
        ObservationFrequency::NineMonths,
        ObservationFrequency::OneYear,
    ];

    /// Returns the interval between observations in seconds (0 for `None`).
    #[inline]
    pub fn seconds(&self) -> u64 {
        match self {
            ObservationFrequency::None => 0,
            ObservationFrequency::OneSecond => 1,
            ObservationFrequency::OneDay => DAY,
            ObservationFrequency::OneWeek => 7 * DAY,
            ObservationFrequency::TwoWeeks => 14 * DAY,
            ObservationFrequency::OneMonth => MONTH,
            ObservationFrequency::TwoMonths => 2 * MONTH,
            ObservationFrequency::ThreeMonths => 3 * MONTH,
            ObservationFrequency::SixMonths => 6 * MONTH,
            ObservationFrequency::NineMonths => 9 * MONTH,
            ObservationFrequency::OneYear => 12 * MONTH,
        }
    }

    /// Canonical exercise discipline for this frequency.
    ///
    /// `None` observes once at expiry, `OneSecond` is continuous monitoring,
    /// every other frequency is a discrete schedule.
    #[inline]
    pub fn exercise(&self) -> ExerciseType {
        match self {
            ObservationFrequency::None => ExerciseType::European,
            ObservationFrequency::OneSecond => ExerciseType::Continuous,
            _ => ExerciseType::Discrete,
        }
    }

    /// Wire code of this frequency.
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Result<Self, CodecError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(CodecError::InvalidFrequency(code))
    }

    /// Returns the short name of this frequency.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            ObservationFrequency::None => "none",
            ObservationFrequency::OneSecond => "1s",
            ObservationFrequency::OneDay => "1d",
            ObservationFrequency::OneWeek => "1w",
            ObservationFrequency::TwoWeeks => "2w",
            ObservationFrequency::OneMonth => "1m",
            ObservationFrequency::TwoMonths => "2m",
            ObservationFrequency::ThreeMonths => "3m",
            ObservationFrequency::SixMonths => "6m",
            ObservationFrequency::NineMonths => "9m",
            ObservationFrequency::OneYear => "1y",
        }
    }
}

impl fmt::Display for ObservationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ObservationFrequency {
    type Err = CodecError;

    /// Parses a frequency from its short name or a descriptive alias
    /// (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "none" | "european" | "atexpiry" => Ok(ObservationFrequency::None),
            "1s" | "onesecond" | "continuous" => Ok(ObservationFrequency::OneSecond),
            "1d" | "oneday" | "daily" => Ok(ObservationFrequency::OneDay),
            "1w" | "oneweek" | "weekly" => Ok(ObservationFrequency::OneWeek),
            "2w" | "twoweeks" | "biweekly" => Ok(ObservationFrequency::TwoWeeks),
            "1m" | "onemonth" | "monthly" => Ok(ObservationFrequency::OneMonth),
            "2m" | "twomonths" => Ok(ObservationFrequency::TwoMonths),
            "3m" | "threemonths" | "quarterly" => Ok(ObservationFrequency::ThreeMonths),
            "6m" | "sixmonths" | "semiannual" => Ok(ObservationFrequency::SixMonths),
            "9m" | "ninemonths" => Ok(ObservationFrequency::NineMonths),
            "1y" | "12m" | "oneyear" | "annual" => Ok(ObservationFrequency::OneYear),
            _ => Err(CodecError::InvalidParameter {
                message: format!("Unknown observation frequency: {}", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds() {
        assert_eq!(ObservationFrequency::None.seconds(), 0);
        assert_eq!(ObservationFrequency::OneSecond.seconds(), 1);
        assert_eq!(ObservationFrequency::OneDay.seconds(), 86_400);
        assert_eq!(ObservationFrequency::TwoWeeks.seconds(), 1_209_600);
        assert_eq!(ObservationFrequency::OneMonth.seconds(), 2_592_000);
        assert_eq!(ObservationFrequency::OneYear.seconds(), 31_104_000);
    }

    #[test]
    fn test_exercise_derivation() {
        assert_eq!(ObservationFrequency::None.exercise(), ExerciseType::European);
        assert_eq!(
            ObservationFrequency::OneSecond.exercise(),
            ExerciseType::Continuous
        );
        for freq in &ObservationFrequency::ALL[2..] {
            assert_eq!(freq.exercise(), ExerciseType::Discrete);
        }
    }

    #[test]
    fn test_code_round_trip() {
        for freq in ObservationFrequency::ALL {
            assert_eq!(ObservationFrequency::from_code(freq.code()).unwrap(), freq);
        }
        assert_eq!(
            ObservationFrequency::from_code(11),
            Err(CodecError::InvalidFrequency(11))
        );
    }

    #[test]
    fn test_from_str_valid() {
        assert_eq!(
            "quarterly".parse::<ObservationFrequency>().unwrap(),
            ObservationFrequency::ThreeMonths
        );
        assert_eq!(
            "1M".parse::<ObservationFrequency>().unwrap(),
            ObservationFrequency::OneMonth
        );
        assert_eq!(
            "continuous".parse::<ObservationFrequency>().unwrap(),
            ObservationFrequency::OneSecond
        );
        assert_eq!(
            "two-weeks".parse::<ObservationFrequency>().unwrap(),
            ObservationFrequency::TwoWeeks
        );
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("fortnightly-ish".parse::<ObservationFrequency>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for freq in ObservationFrequency::ALL {
            assert_eq!(freq.to_string().parse::<ObservationFrequency>().unwrap(), freq);
        }
    }
}
