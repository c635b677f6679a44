//! Venue trait, raw candle rows and structured venue errors.
//!
//! A `Venue` is the only thing that talks to an exchange. It performs exactly
//! one request per call; retry policy lives in `MarketDataSource`.

use crate::domain::{Bar, BarError, Timeframe};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One OHLCV row as returned by a venue: `[timestamp_ms, o, h, l, c, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawCandle {
    pub fn to_bar(&self) -> Result<Bar, BarError> {
        let timestamp = Utc
            .timestamp_millis_opt(self.timestamp_ms)
            .single()
            .ok_or(BarError::InvalidTimestamp(self.timestamp_ms))?;
        Ok(Bar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Structured venue errors, displayable in CLI output and report rows.
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by venue (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("{venue} does not support timeframe {timeframe}")]
    UnsupportedTimeframe {
        venue: ExchangeId,
        timeframe: Timeframe,
    },

    #[error("hard stop: venue has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("venue error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown exchange '{0}' (expected one of: binance, bybit, bitget, synthetic)")]
pub struct UnknownExchange(pub String);

/// Exchanges with a venue adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Bitget,
    Synthetic,
}

impl ExchangeId {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Bybit => "bybit",
            ExchangeId::Bitget => "bitget",
            ExchangeId::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "bybit" => Ok(ExchangeId::Bybit),
            "bitget" => Ok(ExchangeId::Bitget),
            "synthetic" => Ok(ExchangeId::Synthetic),
            _ => Err(UnknownExchange(s.to_string())),
        }
    }
}

/// Trait for OHLCV venues (Binance, Bybit, Bitget, synthetic, test stubs).
pub trait Venue: Send + Sync {
    fn exchange(&self) -> ExchangeId;

    /// Fetch up to `limit` most recent candles for `symbol` (`BASE/QUOTE`).
    ///
    /// Rows may come back in any order; callers sort them.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError>;
}

impl<V: Venue + ?Sized> Venue for std::sync::Arc<V> {
    fn exchange(&self) -> ExchangeId {
        (**self).exchange()
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        (**self).fetch_ohlcv(symbol, timeframe, limit)
    }
}

impl<V: Venue + ?Sized> Venue for Box<V> {
    fn exchange(&self) -> ExchangeId {
        (**self).exchange()
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        (**self).fetch_ohlcv(symbol, timeframe, limit)
    }
}

/// `BTC/USDT` → `BTCUSDT`. Symbols without a slash pass through uppercased.
pub fn venue_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_symbol_strips_separator() {
        assert_eq!(venue_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(venue_symbol("eth-usdt"), "ETHUSDT");
        assert_eq!(venue_symbol("SOLUSDT"), "SOLUSDT");
    }

    #[test]
    fn exchange_id_parses_case_insensitively() {
        assert_eq!("Binance".parse::<ExchangeId>().unwrap(), ExchangeId::Binance);
        assert_eq!("bybit".parse::<ExchangeId>().unwrap(), ExchangeId::Bybit);
        assert_eq!("BITGET".parse::<ExchangeId>().unwrap(), ExchangeId::Bitget);
        assert_eq!(ExchangeId::Bitget.to_string(), "bitget");
        assert!("kraken".parse::<ExchangeId>().is_err());
    }

    #[test]
    fn raw_candle_converts_milliseconds() {
        let raw = RawCandle {
            timestamp_ms: 1_700_000_000_000,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 3.0,
        };
        let bar = raw.to_bar().unwrap();
        assert_eq!(bar.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(bar.close, 1.5);
    }
}
