//! Market data acquisition: venue adapters and the retrying source.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod circuit_breaker;
pub mod http;
pub mod source;
pub mod synthetic;
pub mod venue;

pub use binance::BinanceVenue;
pub use bitget::BitgetVenue;
pub use bybit::BybitVenue;
pub use circuit_breaker::CircuitBreaker;
pub use http::HttpClient;
pub use source::{
    candles_to_series, FetchConfigError, FetchError, FetchFailure, MarketDataSource, RetryPolicy,
};
pub use synthetic::SyntheticVenue;
pub use venue::{venue_symbol, ExchangeId, RawCandle, UnknownExchange, Venue, VenueError};
