//! In-memory TTL cache for venue responses.
//!
//! `CachingVenue` wraps any `Venue` and serves repeated requests for the same
//! (exchange, symbol, timeframe, limit) from memory until the entry is older
//! than the TTL. Errors are never cached, and neither are responses the
//! retrying source would reject (empty or unusable rows), so a retry always
//! reaches the venue again. Core components never see this type; it is
//! opted into by callers such as a repeating watch loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use trendcycle_core::data::{candles_to_series, ExchangeId, RawCandle, Venue, VenueError};
use trendcycle_core::domain::Timeframe;

/// Five minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    exchange: ExchangeId,
    symbol: String,
    timeframe: Timeframe,
    limit: usize,
}

#[derive(Debug)]
struct CacheEntry {
    stored_at: Instant,
    candles: Vec<RawCandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct CachingVenue<V> {
    inner: V,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Venue> CachingVenue<V> {
    pub fn new(inner: V, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    /// Drop every entry, expired or not.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<RawCandle>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.candles.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

impl<V: Venue> Venue for CachingVenue<V> {
    fn exchange(&self) -> ExchangeId {
        self.inner.exchange()
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        let key = CacheKey {
            exchange: self.inner.exchange(),
            symbol: symbol.to_string(),
            timeframe,
            limit,
        };

        if let Some(candles) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(symbol, %timeframe, limit, "cache hit");
            return Ok(candles);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // Lock released while the inner venue does I/O.
        let candles = self.inner.fetch_ohlcv(symbol, timeframe, limit)?;
        if candles.is_empty() || candles_to_series(&candles).is_err() {
            tracing::debug!(symbol, %timeframe, rows = candles.len(), "response not cached");
            return Ok(candles);
        }
        self.lock().insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                candles: candles.clone(),
            },
        );
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use trendcycle_core::data::{MarketDataSource, RetryPolicy};

    struct CountingVenue {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingVenue {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }
    }

    impl Venue for CountingVenue {
        fn exchange(&self) -> ExchangeId {
            ExchangeId::Synthetic
        }

        fn fetch_ohlcv(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<RawCandle>, VenueError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VenueError::NetworkUnreachable("down".into()));
            }
            Ok((0..limit)
                .map(|i| RawCandle {
                    timestamp_ms: i as i64 * 1_000,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1.0,
                })
                .collect())
        }
    }

    #[test]
    fn repeated_request_is_served_from_memory() {
        let venue = CachingVenue::new(CountingVenue::new(false), DEFAULT_CACHE_TTL);
        let a = venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        let b = venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            venue.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn key_includes_timeframe_and_limit() {
        let venue = CachingVenue::new(CountingVenue::new(false), DEFAULT_CACHE_TTL);
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Hour4, 3).unwrap();
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 4).unwrap();
        venue.fetch_ohlcv("ETH/USDT", Timeframe::Day1, 3).unwrap();
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 4);
        assert_eq!(venue.stats().entries, 4);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let venue = CachingVenue::new(CountingVenue::new(false), Duration::ZERO);
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(venue.stats().hits, 0);
    }

    #[test]
    fn errors_are_not_cached() {
        let venue = CachingVenue::new(CountingVenue::new(true), DEFAULT_CACHE_TTL);
        assert!(venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).is_err());
        assert!(venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).is_err());
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(venue.stats().entries, 0);
    }

    /// Returns no rows on the first call, then `rows` candles.
    struct EmptyOnceVenue {
        calls: AtomicU32,
        rows: usize,
    }

    impl Venue for EmptyOnceVenue {
        fn exchange(&self) -> ExchangeId {
            ExchangeId::Synthetic
        }

        fn fetch_ohlcv(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<RawCandle>, VenueError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(Vec::new());
            }
            Ok((0..self.rows)
                .map(|i| RawCandle {
                    timestamp_ms: i as i64 * 60_000,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1.0,
                })
                .collect())
        }
    }

    #[test]
    fn empty_response_is_not_cached_and_retry_reaches_venue() {
        let venue = CachingVenue::new(
            EmptyOnceVenue {
                calls: AtomicU32::new(0),
                rows: 5,
            },
            DEFAULT_CACHE_TTL,
        );
        let policy = RetryPolicy::new(3, Duration::ZERO).unwrap();
        let series = MarketDataSource::new(&venue, policy)
            .fetch("BTC/USDT", Timeframe::Day1, 5)
            .unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            venue.stats(),
            CacheStats {
                hits: 0,
                misses: 2,
                entries: 1
            }
        );
    }

    #[test]
    fn unusable_rows_are_not_cached() {
        struct DuplicateVenue;

        impl Venue for DuplicateVenue {
            fn exchange(&self) -> ExchangeId {
                ExchangeId::Synthetic
            }

            fn fetch_ohlcv(
                &self,
                _symbol: &str,
                _timeframe: Timeframe,
                _limit: usize,
            ) -> Result<Vec<RawCandle>, VenueError> {
                let row = RawCandle {
                    timestamp_ms: 0,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1.0,
                };
                Ok(vec![row, row])
            }
        }

        let venue = CachingVenue::new(DuplicateVenue, DEFAULT_CACHE_TTL);
        assert_eq!(venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 2).unwrap().len(), 2);
        assert_eq!(venue.stats().entries, 0);
    }

    #[test]
    fn clear_forces_refetch() {
        let venue = CachingVenue::new(CountingVenue::new(false), DEFAULT_CACHE_TTL);
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        venue.clear();
        venue.fetch_ohlcv("BTC/USDT", Timeframe::Day1, 3).unwrap();
        assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 2);
    }
}
