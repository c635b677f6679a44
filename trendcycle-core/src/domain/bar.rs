//! Bar, the fundamental market data unit, and the ordered `BarSeries`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one fixed time bucket on a venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("duplicate bar timestamp {0}")]
    DuplicateTimestamp(DateTime<Utc>),

    #[error("bar timestamps out of order at index {index}")]
    OutOfOrder { index: usize },

    #[error("invalid timestamp: {0} ms")]
    InvalidTimestamp(i64),
}

/// Bars ordered by strictly increasing, unique timestamps.
///
/// Gaps in the timeline are allowed: indicators run over the given order
/// with no gap filling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from bars that are already in timestamp order.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp == pair[0].timestamp {
                return Err(BarError::DuplicateTimestamp(pair[1].timestamp));
            }
            if pair[1].timestamp < pair[0].timestamp {
                return Err(BarError::OutOfOrder { index: i + 1 });
            }
        }
        Ok(Self { bars })
    }

    /// Build a series from bars in arbitrary order. Sorts by timestamp and
    /// rejects duplicates.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, BarError> {
        bars.sort_by_key(|b| b.timestamp);
        Self::new(bars)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Deterministic BLAKE3 hash over timestamps and OHLCV values.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
