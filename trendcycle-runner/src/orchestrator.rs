//! Multi-timeframe analysis: fetch → indicators → trend → signals per
//! timeframe, then one cycle phase for the whole report.
//!
//! A failed fetch becomes an error row; the run always yields exactly one
//! row per configured timeframe. Only configuration problems abort, and
//! they do so before any venue request.

use chrono::{DateTime, Datelike, Utc};
use rayon::prelude::*;
use std::time::Duration;

use trendcycle_core::analysis::{
    classify_cycle, classify_trend, detect_signals, Signal, SignalThresholds,
};
use trendcycle_core::data::{MarketDataSource, Venue};
use trendcycle_core::indicators::compute_indicators;

use crate::config::{AnalysisConfig, ConfigError, ExecutionMode, ResolvedTimeframe};
use crate::report::{AnalysisReport, SummaryRow, SCHEMA_VERSION};

/// Result of analysing one timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeOutcome {
    pub row: SummaryRow,
    pub signals: Vec<Signal>,
}

/// Run the full analysis against `venue`.
///
/// `now` stamps the report and selects the cycle year; nothing here reads
/// the wall clock.
pub fn run_analysis(
    config: &AnalysisConfig,
    venue: &dyn Venue,
    now: DateTime<Utc>,
) -> Result<AnalysisReport, ConfigError> {
    config.validate()?;
    let plan = config.resolved_timeframes()?;
    let source = MarketDataSource::new(venue, config.retry_policy()?);

    tracing::info!(
        symbol = %config.symbol,
        exchange = %venue.exchange(),
        timeframes = plan.len(),
        mode = ?config.execution,
        "starting analysis"
    );

    let outcomes = match config.execution {
        ExecutionMode::Sequential => run_sequential(&source, config, &plan),
        ExecutionMode::Parallel => run_parallel(&source, config, &plan),
    };

    let mut rows = Vec::with_capacity(outcomes.len());
    let mut signals = Vec::new();
    for outcome in outcomes {
        rows.push(outcome.row);
        signals.extend(outcome.signals);
    }

    Ok(AnalysisReport {
        schema_version: SCHEMA_VERSION,
        symbol: config.symbol.clone(),
        exchange: venue.exchange(),
        generated_at: now,
        rows,
        signals,
        cycle: classify_cycle(now.year(), config.cycle_reference_year),
    })
}

fn run_sequential(
    source: &MarketDataSource<'_>,
    config: &AnalysisConfig,
    plan: &[ResolvedTimeframe],
) -> Vec<TimeframeOutcome> {
    let delay = config.request_delay();
    plan.iter()
        .enumerate()
        .map(|(i, tf)| {
            if i > 0 {
                pace(delay);
            }
            analyze_timeframe(source, &config.symbol, tf, config.limit, &config.thresholds)
        })
        .collect()
}

/// Indexed collect keeps configured order whatever the completion order.
fn run_parallel(
    source: &MarketDataSource<'_>,
    config: &AnalysisConfig,
    plan: &[ResolvedTimeframe],
) -> Vec<TimeframeOutcome> {
    let delay = config.request_delay();
    plan.par_iter()
        .enumerate()
        .map(|(i, tf)| {
            pace(delay * i as u32);
            analyze_timeframe(source, &config.symbol, tf, config.limit, &config.thresholds)
        })
        .collect()
}

fn pace(delay: Duration) {
    if !delay.is_zero() {
        tracing::trace!(delay_ms = delay.as_millis() as u64, "pacing");
        std::thread::sleep(delay);
    }
}

/// Fetch and analyse one timeframe. Never fails: fetch errors become an
/// error row.
pub fn analyze_timeframe(
    source: &MarketDataSource<'_>,
    symbol: &str,
    tf: &ResolvedTimeframe,
    limit: usize,
    thresholds: &SignalThresholds,
) -> TimeframeOutcome {
    let series = match source.fetch(symbol, tf.timeframe, limit) {
        Ok(series) => series,
        Err(e) => {
            tracing::warn!(label = %tf.label, error = %e, "timeframe failed");
            return TimeframeOutcome {
                row: SummaryRow::error(&tf.label, tf.timeframe, e.to_string()),
                signals: Vec::new(),
            };
        }
    };

    let frame = compute_indicators(series);
    let trend = classify_trend(&frame);
    let signals = detect_signals(&frame, &tf.label, thresholds);

    tracing::info!(
        label = %tf.label,
        bars = frame.len(),
        %trend,
        signals = signals.len(),
        insufficient_history = frame.insufficient_history(),
        "timeframe analysed"
    );

    TimeframeOutcome {
        row: SummaryRow::ok(&tf.label, tf.timeframe, &frame, trend),
        signals,
    }
}
