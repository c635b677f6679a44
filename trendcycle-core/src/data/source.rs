//! MarketDataSource: bounded-retry OHLCV fetching over a `Venue`.
//!
//! Attempt k (1-indexed) that fails is followed by a wait of k × backoff
//! unit, except after the final attempt. An empty response counts as a
//! failed attempt. Exhausted retries produce a `FetchFailure` carrying the
//! last error description; nothing panics past this boundary.
//!
//! No caching happens here. Callers that want it wrap the venue.

use super::venue::{RawCandle, Venue};
use crate::domain::{Bar, BarSeries, Timeframe};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchConfigError {
    #[error("limit must be >= 1")]
    ZeroLimit,

    #[error("max_retries must be >= 1")]
    ZeroRetries,
}

/// Terminal failure after every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetching {symbol} {timeframe} failed after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub attempts: u32,
    pub last_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] FetchConfigError),

    #[error(transparent)]
    Exhausted(#[from] FetchFailure),
}

/// Linear backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Result<Self, FetchConfigError> {
        if max_retries == 0 {
            return Err(FetchConfigError::ZeroRetries);
        }
        Ok(Self {
            max_retries,
            backoff_unit,
        })
    }

    /// Wait after failed attempt `attempt` (1-indexed); `None` after the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_retries).then(|| self.backoff_unit * attempt)
    }
}

pub struct MarketDataSource<'a> {
    venue: &'a dyn Venue,
    policy: RetryPolicy,
}

impl<'a> MarketDataSource<'a> {
    pub fn new(venue: &'a dyn Venue, policy: RetryPolicy) -> Self {
        Self { venue, policy }
    }

    /// Fetch up to `limit` most recent bars.
    pub fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<BarSeries, FetchError> {
        if limit == 0 {
            return Err(FetchConfigError::ZeroLimit.into());
        }

        let max = self.policy.max_retries;
        let mut last_error = String::from("unknown error");

        for attempt in 1..=max {
            match self.attempt(symbol, timeframe, limit) {
                Ok(series) => {
                    tracing::debug!(
                        venue = %self.venue.exchange(),
                        symbol,
                        %timeframe,
                        bars = series.len(),
                        attempt,
                        "fetched bars"
                    );
                    return Ok(series);
                }
                Err(reason) => {
                    tracing::warn!(
                        venue = %self.venue.exchange(),
                        symbol,
                        %timeframe,
                        attempt,
                        max_retries = max,
                        error = %reason,
                        "fetch attempt failed"
                    );
                    last_error = reason;
                }
            }

            if let Some(delay) = self.policy.delay_after(attempt) {
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
        }

        Err(FetchFailure {
            symbol: symbol.to_string(),
            timeframe,
            attempts: max,
            last_error,
        }
        .into())
    }

    fn attempt(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<BarSeries, String> {
        let candles = self
            .venue
            .fetch_ohlcv(symbol, timeframe, limit)
            .map_err(|e| e.to_string())?;
        if candles.is_empty() {
            return Err("venue returned 0 bars".to_string());
        }
        candles_to_series(&candles).map_err(|e| e.to_string())
    }
}

/// Convert venue rows (any order) into a validated series.
pub fn candles_to_series(candles: &[RawCandle]) -> Result<BarSeries, crate::domain::BarError> {
    let bars = candles
        .iter()
        .map(RawCandle::to_bar)
        .collect::<Result<Vec<Bar>, _>>()?;
    BarSeries::from_unsorted(bars)
}
