//! Exponential Moving Average (EMA).
//!
//! One recurrence for every EMA in the crate (EMA20, both MACD legs and the
//! MACD signal line):
//!   seed   = SMA of the first `period` available values
//!   EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1],  alpha = 2 / (period + 1)
//! Leading `None`s in the input shift the seed window; a `None` after the
//! seed blanks the remainder.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<Option<f64>> = bars
            .iter()
            .map(|b| b.close.is_finite().then_some(b.close))
            .collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over an optional series (used for closes and for the MACD line).
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 {
        return result;
    }

    let Some(start) = values.iter().position(Option::is_some) else {
        return result;
    };
    let seed_end = start + period;
    if seed_end > n {
        return result;
    }

    let mut sum = 0.0;
    for v in &values[start..seed_end] {
        match v {
            Some(x) => sum += x,
            None => return result,
        }
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = sum / period as f64;
    result[seed_end - 1] = Some(prev);

    for i in seed_end..n {
        let Some(x) = values[i] else {
            break;
        };
        prev = alpha * x + (1.0 - alpha) * prev;
        result[i] = Some(prev);
    }

    result
}
