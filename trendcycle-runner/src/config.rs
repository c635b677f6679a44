//! Serializable analysis configuration.
//!
//! Loaded from TOML; every field has a default so partial files work. All
//! validation happens in `validate()` before any network I/O.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use trendcycle_core::analysis::{SignalThresholds, DEFAULT_REFERENCE_YEAR};
use trendcycle_core::data::{ExchangeId, FetchConfigError, RetryPolicy, UnknownExchange};
use trendcycle_core::domain::{Timeframe, UnknownTimeframe};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("at least one timeframe must be configured")]
    NoTimeframes,

    #[error("timeframe label must not be empty (code '{code}')")]
    EmptyLabel { code: String },

    #[error("duplicate timeframe label '{0}'")]
    DuplicateLabel(String),

    #[error(transparent)]
    UnknownTimeframe(#[from] UnknownTimeframe),

    #[error(transparent)]
    UnknownExchange(#[from] UnknownExchange),

    #[error(transparent)]
    Fetch(#[from] FetchConfigError),

    #[error("signal proximity must be positive and finite, got {0}")]
    InvalidProximity(f64),

    #[error("signal zero line must be finite, got {0}")]
    InvalidZeroLine(f64),
}

/// How timeframes are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One timeframe after another, paced by `request_delay_ms`.
    #[default]
    Sequential,
    /// Fan out on the rayon pool, request i staggered by i × `request_delay_ms`.
    Parallel,
}

/// One configured timeframe: a display label and a venue-independent code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeEntry {
    pub label: String,
    pub code: String,
}

impl TimeframeEntry {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }
}

/// A validated timeframe entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTimeframe {
    pub label: String,
    pub timeframe: Timeframe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// `BASE/QUOTE`, e.g. "BTC/USDT".
    pub symbol: String,

    pub exchange: ExchangeId,

    /// Most recent bars requested per timeframe.
    pub limit: usize,

    /// Attempts per fetch, including the first.
    pub max_retries: u32,

    /// Linear backoff unit: wait k × unit after failed attempt k.
    pub backoff_unit_ms: u64,

    /// Pacing between successive venue requests.
    pub request_delay_ms: u64,

    pub request_timeout_secs: u64,

    pub execution: ExecutionMode,

    pub cycle_reference_year: i32,

    /// Seed for the synthetic venue; ignored by real venues.
    pub synthetic_seed: u64,

    // TOML tables must follow plain values.
    pub thresholds: SignalThresholds,

    /// Evaluated and reported in this order.
    pub timeframes: Vec<TimeframeEntry>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::default_btc()
    }
}

impl AnalysisConfig {
    /// BTC/USDT on Binance across the monthly to hourly timeframes.
    pub fn default_btc() -> Self {
        Self {
            symbol: "BTC/USDT".to_string(),
            exchange: ExchangeId::Binance,
            limit: 1000,
            max_retries: 3,
            backoff_unit_ms: 1_000,
            request_delay_ms: 500,
            request_timeout_secs: 30,
            execution: ExecutionMode::Sequential,
            cycle_reference_year: DEFAULT_REFERENCE_YEAR,
            synthetic_seed: 42,
            thresholds: SignalThresholds::default(),
            timeframes: ["1M", "1w", "1d", "4h", "1h"]
                .into_iter()
                .map(|code| TimeframeEntry::new(code, code))
                .collect(),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every constraint; the first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.limit == 0 {
            return Err(FetchConfigError::ZeroLimit.into());
        }
        self.retry_policy()?;
        self.resolved_timeframes()?;

        let SignalThresholds {
            proximity,
            zero_line,
        } = self.thresholds;
        if !(proximity.is_finite() && proximity > 0.0) {
            return Err(ConfigError::InvalidProximity(proximity));
        }
        if !zero_line.is_finite() {
            return Err(ConfigError::InvalidZeroLine(zero_line));
        }
        Ok(())
    }

    /// Parse timeframe codes, rejecting empty lists, blank and duplicate labels.
    pub fn resolved_timeframes(&self) -> Result<Vec<ResolvedTimeframe>, ConfigError> {
        if self.timeframes.is_empty() {
            return Err(ConfigError::NoTimeframes);
        }

        let mut seen = HashSet::new();
        self.timeframes
            .iter()
            .map(|entry| {
                let label = entry.label.trim();
                if label.is_empty() {
                    return Err(ConfigError::EmptyLabel {
                        code: entry.code.clone(),
                    });
                }
                if !seen.insert(label.to_string()) {
                    return Err(ConfigError::DuplicateLabel(label.to_string()));
                }
                Ok(ResolvedTimeframe {
                    label: label.to_string(),
                    timeframe: entry.code.parse()?,
                })
            })
            .collect()
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        Ok(RetryPolicy::new(self.max_retries, self.backoff_unit())?)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Override the exchange from a user-supplied id.
    pub fn set_exchange(&mut self, id: &str) -> Result<(), ConfigError> {
        self.exchange = id.parse()?;
        Ok(())
    }
}
