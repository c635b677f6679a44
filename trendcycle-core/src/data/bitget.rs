//! Bitget v2 spot candles adapter (`GET /api/v2/spot/market/candles`).
//!
//! The envelope carries a string `code` ("00000" on success) and `msg`; rows
//! under `data` are `[ts, open, high, low, close, baseVol, usdtVol, quoteVol]`
//! as strings, newest first.

use super::http::{value_as_f64, value_as_i64, HttpClient};
use super::venue::{venue_symbol, ExchangeId, RawCandle, Venue, VenueError};
use crate::domain::Timeframe;
use serde::Deserialize;
use serde_json::Value;

pub const BITGET_BASE_URL: &str = "https://api.bitget.com";

pub const BITGET_MAX_LIMIT: usize = 1000;

const SUCCESS_CODE: &str = "00000";

// "Parameter does not exist", returned for unknown trading pairs.
const UNKNOWN_SYMBOL_CODE: &str = "40034";

#[derive(Debug, Deserialize)]
struct CandleEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
}

pub struct BitgetVenue {
    http: HttpClient,
    base_url: String,
}

impl BitgetVenue {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: BITGET_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bitget granularity strings; 2h and 8h have no Bitget equivalent.
    pub fn granularity(timeframe: Timeframe) -> Option<&'static str> {
        let code = match timeframe {
            Timeframe::Minute1 => "1min",
            Timeframe::Minute3 => "3min",
            Timeframe::Minute5 => "5min",
            Timeframe::Minute15 => "15min",
            Timeframe::Minute30 => "30min",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Hour6 => "6h",
            Timeframe::Hour12 => "12h",
            Timeframe::Day1 => "1day",
            Timeframe::Day3 => "3day",
            Timeframe::Week1 => "1week",
            Timeframe::Month1 => "1M",
            Timeframe::Hour2 | Timeframe::Hour8 => return None,
        };
        Some(code)
    }

    fn candles_url(&self, symbol: &str, granularity: &str, limit: usize) -> String {
        format!(
            "{}/api/v2/spot/market/candles?symbol={}&granularity={}&limit={}",
            self.base_url.trim_end_matches('/'),
            venue_symbol(symbol),
            granularity,
            limit.min(BITGET_MAX_LIMIT)
        )
    }

    fn is_unknown_symbol(code: &str, msg: &str) -> bool {
        code == UNKNOWN_SYMBOL_CODE || msg.to_lowercase().contains("symbol")
    }

    fn parse_envelope(symbol: &str, envelope: CandleEnvelope) -> Result<Vec<RawCandle>, VenueError> {
        if envelope.code != SUCCESS_CODE {
            if Self::is_unknown_symbol(&envelope.code, &envelope.msg) {
                return Err(VenueError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            return Err(VenueError::Other(format!(
                "bitget code {}: {}",
                envelope.code, envelope.msg
            )));
        }
        let rows = envelope
            .data
            .ok_or_else(|| VenueError::ResponseFormatChanged("missing data".into()))?;

        let mut candles = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let field = |idx: usize| {
                    row.get(idx).and_then(value_as_f64).ok_or_else(|| {
                        VenueError::ResponseFormatChanged(format!(
                            "candle row {i}: missing or non-numeric field {idx}"
                        ))
                    })
                };
                let timestamp_ms = row.first().and_then(value_as_i64).ok_or_else(|| {
                    VenueError::ResponseFormatChanged(format!("candle row {i}: bad timestamp"))
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
        candles.sort_by_key(|c| c.timestamp_ms);
        Ok(candles)
    }
}

impl Venue for BitgetVenue {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bitget
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        let granularity = Self::granularity(timeframe).ok_or(VenueError::UnsupportedTimeframe {
            venue: ExchangeId::Bitget,
            timeframe,
        })?;
        let url = self.candles_url(symbol, granularity, limit);
        // Parameter errors arrive as HTTP 400 with the envelope in the body.
        let envelope: CandleEnvelope = self.http.get_json(&url).map_err(|e| match e {
            VenueError::Http { status: 400, message } if message.contains(UNKNOWN_SYMBOL_CODE) => {
                VenueError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            }
            other => other,
        })?;
        Self::parse_envelope(symbol, envelope)
    }
}
