//! MACD cross and return-move signal detection on the last two bars.
//!
//! Rules, evaluated in this order (zero to four may fire):
//! 1. MACD below zero and golden cross → `MacdGoldenCrossLow`
//! 2. MACD below zero, close near EMA20, histogram improving → `ReturnMoveBuy`
//! 3. MACD above zero and dead cross → `MacdDeadCrossHigh`
//! 4. MACD above zero, close near EMA20, histogram deteriorating → `ReturnMoveSell`

use crate::indicators::{FrameRow, IndicatorFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    MacdGoldenCrossLow,
    MacdDeadCrossHigh,
    ReturnMoveBuy,
    ReturnMoveSell,
}

impl SignalKind {
    pub fn description(self) -> &'static str {
        match self {
            SignalKind::MacdGoldenCrossLow => "MACD golden cross (low zone)",
            SignalKind::MacdDeadCrossHigh => "MACD dead cross (high zone)",
            SignalKind::ReturnMoveBuy => {
                "Possible return-move buy (price near EMA20 + MACD improving)"
            }
            SignalKind::ReturnMoveSell => {
                "Possible return-move sell (price near EMA20 + MACD deteriorating)"
            }
        }
    }

    /// True for the buy-side signals.
    pub fn is_long(self) -> bool {
        matches!(self, SignalKind::MacdGoldenCrossLow | SignalKind::ReturnMoveBuy)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub timeframe: String,
    pub kind: SignalKind,
    pub message: String,
}

impl Signal {
    pub fn new(timeframe: &str, kind: SignalKind) -> Self {
        Self {
            timeframe: timeframe.to_string(),
            kind,
            message: format!("[{timeframe}] {}", kind.description()),
        }
    }
}

/// Policy values for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// Relative distance |close - ema20| / close below which price is "near" EMA20.
    pub proximity: f64,
    /// MACD level separating the low zone from the high zone.
    pub zero_line: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            proximity: 0.005,
            zero_line: 0.0,
        }
    }
}

/// MACD state of one bar; only built when every field is available.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MacdPoint {
    macd: f64,
    signal: f64,
    hist: f64,
}

impl MacdPoint {
    fn from_row(row: &FrameRow<'_>) -> Option<Self> {
        Some(Self {
            macd: row.derived.macd?,
            signal: row.derived.macd_signal?,
            hist: row.derived.macd_hist?,
        })
    }
}

/// The individual tests behind the emission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalConditions {
    pub near_ema20: bool,
    pub golden_cross: bool,
    pub dead_cross: bool,
    pub hist_improving: bool,
    pub hist_deteriorating: bool,
    pub macd_below_zero: bool,
    pub macd_above_zero: bool,
}

impl SignalConditions {
    /// `None` when either bar lacks MACD values or EMA20.
    pub fn evaluate(
        prev: &FrameRow<'_>,
        last: &FrameRow<'_>,
        thresholds: &SignalThresholds,
    ) -> Option<Self> {
        let p = MacdPoint::from_row(prev)?;
        let l = MacdPoint::from_row(last)?;
        prev.derived.ema20?;
        let ema20 = last.derived.ema20?;
        let close = last.bar.close;

        let near_ema20 = close > 0.0 && (close - ema20).abs() / close < thresholds.proximity;

        Some(Self {
            near_ema20,
            golden_cross: p.macd <= p.signal && l.macd > l.signal,
            dead_cross: p.macd >= p.signal && l.macd < l.signal,
            hist_improving: l.hist > p.hist && l.hist < 0.0,
            hist_deteriorating: l.hist < p.hist && l.hist > 0.0,
            macd_below_zero: l.macd < thresholds.zero_line,
            macd_above_zero: l.macd > thresholds.zero_line,
        })
    }

    /// Signals implied by these conditions, in rule order.
    pub fn kinds(&self) -> Vec<SignalKind> {
        let mut kinds = Vec::new();
        if self.macd_below_zero && self.golden_cross {
            kinds.push(SignalKind::MacdGoldenCrossLow);
        }
        if self.macd_below_zero && self.near_ema20 && self.hist_improving {
            kinds.push(SignalKind::ReturnMoveBuy);
        }
        if self.macd_above_zero && self.dead_cross {
            kinds.push(SignalKind::MacdDeadCrossHigh);
        }
        if self.macd_above_zero && self.near_ema20 && self.hist_deteriorating {
            kinds.push(SignalKind::ReturnMoveSell);
        }
        kinds
    }
}

/// Detect signals on the last two bars of `frame`.
///
/// Returns an empty list (not an error) when fewer than two bars exist or
/// the required indicator values are unavailable.
pub fn detect_signals(
    frame: &IndicatorFrame,
    timeframe: &str,
    thresholds: &SignalThresholds,
) -> Vec<Signal> {
    let Some((prev, last)) = frame.last_two() else {
        return Vec::new();
    };
    let Some(conditions) = SignalConditions::evaluate(&prev, &last, thresholds) else {
        return Vec::new();
    };
    conditions
        .kinds()
        .into_iter()
        .map(|kind| Signal::new(timeframe, kind))
        .collect()
}
