//! Binance spot klines adapter (`GET /api/v3/klines`).
//!
//! Rows are `[openTime, open, high, low, close, volume, closeTime, ...]`
//! with prices as decimal strings, oldest first.

use super::http::{value_as_f64, value_as_i64, HttpClient};
use super::venue::{venue_symbol, ExchangeId, RawCandle, Venue, VenueError};
use crate::domain::Timeframe;
use serde_json::Value;

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Upper bound Binance accepts for `limit`.
pub const BINANCE_MAX_LIMIT: usize = 1000;

// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: &str = "-1121";

pub struct BinanceVenue {
    http: HttpClient,
    base_url: String,
}

impl BinanceVenue {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: BINANCE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Binance interval strings match the common codes one-to-one.
    pub fn interval(timeframe: Timeframe) -> &'static str {
        timeframe.code()
    }

    fn klines_url(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url.trim_end_matches('/'),
            venue_symbol(symbol),
            Self::interval(timeframe),
            limit.min(BINANCE_MAX_LIMIT)
        )
    }

    fn parse_rows(rows: Vec<Vec<Value>>) -> Result<Vec<RawCandle>, VenueError> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let field = |idx: usize| {
                    row.get(idx).and_then(value_as_f64).ok_or_else(|| {
                        VenueError::ResponseFormatChanged(format!(
                            "kline row {i}: missing or non-numeric field {idx}"
                        ))
                    })
                };
                let timestamp_ms = row.first().and_then(value_as_i64).ok_or_else(|| {
                    VenueError::ResponseFormatChanged(format!("kline row {i}: bad open time"))
                })?;
                Ok(RawCandle {
                    timestamp_ms,
                    open: field(1)?,
                    high: field(2)?,
                    low: field(3)?,
                    close: field(4)?,
                    volume: field(5)?,
                })
            })
            .collect()
    }
}

impl Venue for BinanceVenue {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        if limit > BINANCE_MAX_LIMIT {
            tracing::debug!(limit, max = BINANCE_MAX_LIMIT, "clamping Binance kline limit");
        }
        let url = self.klines_url(symbol, timeframe, limit);
        let rows: Vec<Vec<Value>> = self.http.get_json(&url).map_err(|e| match e {
            VenueError::Http { status: 400, message } if message.contains(INVALID_SYMBOL_CODE) => {
                VenueError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            }
            other => other,
        })?;
        Self::parse_rows(rows)
    }
}
