//! Bybit v5 spot kline adapter (`GET /v5/market/kline?category=spot`).
//!
//! The envelope carries `retCode`/`retMsg`; rows under `result.list` are
//! `[startTime, open, high, low, close, volume, turnover]` as strings,
//! newest first.

use super::http::{value_as_f64, value_as_i64, HttpClient};
use super::venue::{venue_symbol, ExchangeId, RawCandle, Venue, VenueError};
use crate::domain::Timeframe;
use serde::Deserialize;
use serde_json::Value;

pub const BYBIT_BASE_URL: &str = "https://api.bybit.com";

pub const BYBIT_MAX_LIMIT: usize = 1000;

// retCode for "params error", which Bybit also uses for unknown symbols.
const PARAMS_ERROR: i64 = 10001;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KlineEnvelope {
    ret_code: i64,
    ret_msg: String,
    result: Option<KlineResult>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<Value>>,
}

pub struct BybitVenue {
    http: HttpClient,
    base_url: String,
}

impl BybitVenue {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: BYBIT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bybit interval strings; 8h and 3d have no Bybit equivalent.
    pub fn interval(timeframe: Timeframe) -> Option<&'static str> {
        let code = match timeframe {
            Timeframe::Minute1 => "1",
            Timeframe::Minute3 => "3",
            Timeframe::Minute5 => "5",
            Timeframe::Minute15 => "15",
            Timeframe::Minute30 => "30",
            Timeframe::Hour1 => "60",
            Timeframe::Hour2 => "120",
            Timeframe::Hour4 => "240",
            Timeframe::Hour6 => "360",
            Timeframe::Hour12 => "720",
            Timeframe::Day1 => "D",
            Timeframe::Week1 => "W",
            Timeframe::Month1 => "M",
            Timeframe::Hour8 | Timeframe::Day3 => return None,
        };
        Some(code)
    }

    fn kline_url(&self, symbol: &str, interval: &str, limit: usize) -> String {
        format!(
            "{}/v5/market/kline?category=spot&symbol={}&interval={}&limit={}",
            self.base_url.trim_end_matches('/'),
            venue_symbol(symbol),
            interval,
            limit.min(BYBIT_MAX_LIMIT)
        )
    }

    fn parse_envelope(symbol: &str, envelope: KlineEnvelope) -> Result<Vec<RawCandle>, VenueError> {
        if envelope.ret_code == PARAMS_ERROR && envelope.ret_msg.to_lowercase().contains("symbol") {
            return Err(VenueError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if envelope.ret_code != 0 {
            return Err(VenueError::Other(format!(
                "bybit retCode {}: {}",
                envelope.ret_code, envelope.ret_msg
            )));
        }
        let rows = envelope
            .result
            .ok_or_else(|| VenueError::ResponseFormatChanged("missing result".into()))?
            .list;

        let mut candles = rows
            .iter()
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
                    VenueError::ResponseFormatChanged(format!("kline row {i}: bad start time"))
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
            .collect::<Result<Vec<_>, VenueError>>()?;
        candles.reverse();
        Ok(candles)
    }
}

impl Venue for BybitVenue {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        let interval = Self::interval(timeframe).ok_or(VenueError::UnsupportedTimeframe {
            venue: ExchangeId::Bybit,
            timeframe,
        })?;
        let url = self.kline_url(symbol, interval, limit);
        let envelope: KlineEnvelope = self.http.get_json(&url)?;
        Self::parse_envelope(symbol, envelope)
    }
}
