//! Build the configured venue adapter.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use trendcycle_core::data::{
    BinanceVenue, BitgetVenue, BybitVenue, CircuitBreaker, ExchangeId, HttpClient, SyntheticVenue,
    Venue, VenueError,
};

use crate::config::AnalysisConfig;

/// One adapter per call, each with its own circuit breaker.
///
/// The synthetic venue anchors its newest candle at `now`.
pub fn build_venue(
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Result<Box<dyn Venue>, VenueError> {
    let venue: Box<dyn Venue> = match config.exchange {
        ExchangeId::Binance => Box::new(BinanceVenue::new(http_client(config)?)),
        ExchangeId::Bybit => Box::new(BybitVenue::new(http_client(config)?)),
        ExchangeId::Bitget => Box::new(BitgetVenue::new(http_client(config)?)),
        ExchangeId::Synthetic => Box::new(SyntheticVenue::new(config.synthetic_seed, now)),
    };
    tracing::debug!(exchange = %config.exchange, "venue ready");
    Ok(venue)
}

fn http_client(config: &AnalysisConfig) -> Result<HttpClient, VenueError> {
    let breaker = Arc::new(CircuitBreaker::default_venue());
    HttpClient::new(breaker, config.request_timeout())
}
