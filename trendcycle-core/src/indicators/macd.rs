//! MACD (Moving Average Convergence Divergence).
//!
//! One pass over the closes yields all three index-aligned series:
//! - Line: EMA(close, fast) - EMA(close, slow), first value at slow - 1
//! - Signal: EMA(line, signal), first value at slow + signal - 2
//! - Histogram: line - signal

use super::ema::ema_of_series;
use crate::domain::Bar;

/// All three MACD series, index-aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self { fast, slow, signal }
    }

    /// Standard 12/26/9 parameters.
    pub fn standard() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn compute(&self, bars: &[Bar]) -> MacdSeries {
        let closes: Vec<Option<f64>> = bars
            .iter()
            .map(|b| b.close.is_finite().then_some(b.close))
            .collect();

        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();

        let signal = ema_of_series(&line, self.signal);

        let histogram = line
            .iter()
            .zip(&signal)
            .map(|(l, s)| Some((*l)? - (*s)?))
            .collect();

        MacdSeries {
            line,
            signal,
            histogram,
        }
    }
}
