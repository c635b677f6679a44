//! TrendCycle Core: market data, indicators, and classifiers.
//!
//! This crate contains everything below the orchestration layer:
//! - Domain types (bars, validated bar series, timeframes)
//! - Venue adapters (Binance, Bybit, Bitget, synthetic) behind the `Venue` trait
//! - Bounded-retry fetching with linear backoff and a circuit breaker
//! - SMA / EMA / MACD indicators and the 200-bar-gated `IndicatorFrame`
//! - Trend classification, MACD signal detection, and the four-year cycle

pub mod analysis;
pub mod data;
pub mod domain;
pub mod indicators;
