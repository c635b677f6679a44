//! Trend classification from the final bar and its long moving averages.

use crate::indicators::IndicatorFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Up,
    Down,
    Range,
    InsufficientData,
    NotAvailable,
}

impl TrendLabel {
    pub fn description(self) -> &'static str {
        match self {
            TrendLabel::Up => "Uptrend",
            TrendLabel::Down => "Downtrend",
            TrendLabel::Range => "Range / neutral",
            TrendLabel::InsufficientData => "Insufficient data (200+ bars required)",
            TrendLabel::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Classify the trend at the last bar of `frame`.
///
/// Above both SMA100 and SMA200 is `Up`, below both is `Down`, anything in
/// between (including equality) is `Range`. Earlier bars only matter through
/// the moving averages already computed into the frame.
pub fn classify_trend(frame: &IndicatorFrame) -> TrendLabel {
    let Some(last) = frame.last() else {
        return TrendLabel::NotAvailable;
    };
    let (Some(sma100), Some(sma200)) = (last.derived.sma100, last.derived.sma200) else {
        return TrendLabel::InsufficientData;
    };
    let close = last.bar.close;

    if close > sma200 && close > sma100 {
        TrendLabel::Up
    } else if close < sma200 && close < sma100 {
        TrendLabel::Down
    } else {
        TrendLabel::Range
    }
}
