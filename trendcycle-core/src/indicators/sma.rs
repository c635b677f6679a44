//! Simple Moving Average (SMA) of close.
//!
//! First value at index period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        // Running sum over finite closes; `bad` counts non-finite ones in the window.
        let mut sum = 0.0;
        let mut bad = 0usize;
        for (i, bar) in bars.iter().enumerate() {
            if bar.close.is_finite() {
                sum += bar.close;
            } else {
                bad += 1;
            }
            if i >= self.period {
                let leaving = bars[i - self.period].close;
                if leaving.is_finite() {
                    sum -= leaving;
                } else {
                    bad -= 1;
                }
            }
            if i + 1 >= self.period && bad == 0 {
                result[i] = Some(sum / self.period as f64);
            }
        }

        result
    }
}
