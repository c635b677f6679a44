//! Indicator implementations and the per-bar `IndicatorFrame`.
//!
//! Every indicator produces one `Option<f64>` per input bar; `None` marks
//! warm-up (or a non-finite input in the window), never a fabricated value.
//! The frame engine gates all of them behind a 200-bar history requirement.

pub mod ema;
pub mod frame;
pub mod macd;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use frame::{compute_indicators, DerivedValues, FrameRow, IndicatorFrame, MIN_HISTORY};
pub use macd::{Macd, MacdSeries};
pub use sma::Sma;

use crate::domain::Bar;

/// Pure indicator: bar history in, one optional value per bar out.
///
/// No value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "sma_200", "ema_20").
    fn name(&self) -> &str;

    /// Number of leading bars that are always `None`.
    fn lookback(&self) -> usize;

    /// Returns a vector of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close, high/low = max/min(open, close) ± 1, hourly spacing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
