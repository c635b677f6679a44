//! TrendCycle Runner: multi-timeframe analysis orchestration.
//!
//! This crate builds on `trendcycle-core` to provide:
//! - TOML configuration with validation before any network I/O
//! - Sequential or rayon-parallel analysis across configured timeframes
//! - The typed `AnalysisReport` (summary rows, signals, cycle phase)
//! - JSON / CSV / Markdown export and on-disk report bundles
//! - A caller-side TTL cache for repeated venue requests

pub mod cache;
pub mod config;
pub mod export;
pub mod orchestrator;
pub mod report;
pub mod venues;

pub use cache::{CacheStats, CachingVenue, DEFAULT_CACHE_TTL};
pub use config::{AnalysisConfig, ConfigError, ExecutionMode, ResolvedTimeframe, TimeframeEntry};
pub use export::{
    generate_markdown, load_report, report_from_json, report_json, rows_csv, save_report,
    signals_csv,
};
pub use orchestrator::{analyze_timeframe, run_analysis, TimeframeOutcome};
pub use report::{AnalysisReport, RowStatus, SummaryRow, SCHEMA_VERSION};
pub use venues::build_venue;
