//! IndicatorFrame: a bar series plus per-bar derived values.
//!
//! `compute_indicators` is the indicator engine: SMA 7/25/100/200, EMA 20 and
//! MACD 12/26/9 over close. Series shorter than `MIN_HISTORY` bars get no
//! derived values at all and are flagged `insufficient_history`, so every
//! timeframe is gated by the same warm-up.

use super::{Ema, Indicator, Macd, Sma};
use crate::domain::{Bar, BarSeries};
use serde::{Deserialize, Serialize};

/// Bars required before any derived field is computed.
pub const MIN_HISTORY: usize = 200;

/// Derived values for one bar. `None` = not yet available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedValues {
    pub sma7: Option<f64>,
    pub sma25: Option<f64>,
    pub sma100: Option<f64>,
    pub sma200: Option<f64>,
    pub ema20: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
}

impl DerivedValues {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One bar together with its derived values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRow<'a> {
    pub bar: &'a Bar,
    pub derived: &'a DerivedValues,
}

/// Invariant: `derived` is index-aligned with `series`, and a frame flagged
/// `insufficient_history` carries no derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    series: BarSeries,
    derived: Vec<DerivedValues>,
    insufficient_history: bool,
}

impl IndicatorFrame {
    /// Assemble a frame from precomputed columns.
    ///
    /// `derived` is padded or truncated to the series length. A series shorter
    /// than `MIN_HISTORY` keeps no derived values, whatever was passed in.
    pub fn from_parts(series: BarSeries, mut derived: Vec<DerivedValues>) -> Self {
        let insufficient_history = series.len() < MIN_HISTORY;
        if insufficient_history {
            derived.clear();
        }
        derived.resize(series.len(), DerivedValues::default());
        Self {
            series,
            derived,
            insufficient_history,
        }
    }

    /// Hand-built frame for classifier tests on a few bars. Skips the
    /// history gate; `derived` must match the series length.
    #[cfg(test)]
    pub(crate) fn with_derived(series: BarSeries, derived: Vec<DerivedValues>) -> Self {
        assert_eq!(series.len(), derived.len());
        Self {
            series,
            derived,
            insufficient_history: false,
        }
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn derived(&self) -> &[DerivedValues] {
        &self.derived
    }

    pub fn insufficient_history(&self) -> bool {
        self.insufficient_history
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<FrameRow<'_>> {
        Some(FrameRow {
            bar: self.series.bars().get(index)?,
            derived: self.derived.get(index)?,
        })
    }

    pub fn last(&self) -> Option<FrameRow<'_>> {
        self.row(self.len().checked_sub(1)?)
    }

    /// The last two rows as `(prev, last)`.
    pub fn last_two(&self) -> Option<(FrameRow<'_>, FrameRow<'_>)> {
        let n = self.len();
        if n < 2 {
            return None;
        }
        Some((self.row(n - 2)?, self.row(n - 1)?))
    }
}

/// Compute every derived column for `series`.
///
/// Pure: identical input yields bit-identical output.
pub fn compute_indicators(series: BarSeries) -> IndicatorFrame {
    let n = series.len();
    if n < MIN_HISTORY {
        return IndicatorFrame::from_parts(series, vec![DerivedValues::default(); n]);
    }

    let bars = series.bars();
    let sma7 = Sma::new(7).compute(bars);
    let sma25 = Sma::new(25).compute(bars);
    let sma100 = Sma::new(100).compute(bars);
    let sma200 = Sma::new(200).compute(bars);
    let ema20 = Ema::new(20).compute(bars);
    let macd = Macd::standard().compute(bars);

    let derived = (0..n)
        .map(|i| DerivedValues {
            sma7: sma7[i],
            sma25: sma25[i],
            sma100: sma100[i],
            sma200: sma200[i],
            ema20: ema20[i],
            macd: macd.line[i],
            macd_signal: macd.signal[i],
            macd_hist: macd.histogram[i],
        })
        .collect();

    IndicatorFrame::from_parts(series, derived)
}
