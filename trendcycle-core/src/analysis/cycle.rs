//! Four-year macro cycle phase: three up years followed by one down year.
//!
//! Pure function of the calendar year; callers pass the year explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Year the cycle counts from (a down year).
pub const DEFAULT_REFERENCE_YEAR: i32 = 2022;

const CYCLE_LENGTH: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    LongPreferred,
    ShortPreferred,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::LongPreferred => f.write_str("Long (buy) preferred"),
            Bias::ShortPreferred => f.write_str("Short (sell) preferred"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePhase {
    pub label: String,
    /// 0 = down year, 1..=3 = up years.
    pub position: u8,
    pub bias: Bias,
}

/// Classify `current_year` relative to `reference_year`.
///
/// Years before the reference wrap with a non-negative modulo. The offset is
/// taken in i64 so any pair of i32 years is accepted.
pub fn classify_cycle(current_year: i32, reference_year: i32) -> CyclePhase {
    let offset = i64::from(current_year) - i64::from(reference_year);
    let position = offset.rem_euclid(CYCLE_LENGTH) as u8;

    match position {
        0 if current_year == reference_year => CyclePhase {
            label: "Down (bottom year)".to_string(),
            position,
            bias: Bias::ShortPreferred,
        },
        0 => CyclePhase {
            label: "Down (correction year)".to_string(),
            position,
            bias: Bias::ShortPreferred,
        },
        n => CyclePhase {
            label: format!("Up (year {n})"),
            position,
            bias: Bias::LongPreferred,
        },
    }
}
