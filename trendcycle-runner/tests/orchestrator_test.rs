//! Orchestrator behaviour against stub and synthetic venues.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use trendcycle_core::analysis::{Bias, SignalKind, TrendLabel};
use trendcycle_core::data::{ExchangeId, RawCandle, SyntheticVenue, Venue, VenueError};
use trendcycle_core::domain::Timeframe;
use trendcycle_runner::{
    run_analysis, AnalysisConfig, CachingVenue, ConfigError, ExecutionMode, RowStatus,
    TimeframeEntry, DEFAULT_CACHE_TTL,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

fn config(codes: &[&str]) -> AnalysisConfig {
    AnalysisConfig {
        timeframes: codes.iter().map(|c| TimeframeEntry::new(*c, *c)).collect(),
        limit: 250,
        max_retries: 2,
        backoff_unit_ms: 0,
        request_delay_ms: 0,
        ..AnalysisConfig::default_btc()
    }
}

/// Rising closes for every timeframe except those listed in `failing`.
struct StubVenue {
    failing: HashSet<Timeframe>,
    calls: AtomicU32,
    seen: Mutex<Vec<Timeframe>>,
}

impl StubVenue {
    fn new(failing: &[Timeframe]) -> Self {
        Self {
            failing: failing.iter().copied().collect(),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Venue for StubVenue {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Synthetic
    }

    fn fetch_ohlcv(
        &self,
        _symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(timeframe);
        if self.failing.contains(&timeframe) {
            return Err(VenueError::Http {
                status: 503,
                message: "maintenance".into(),
            });
        }
        let step = timeframe.minutes() * 60_000;
        Ok((0..limit)
            .map(|i| {
                let close = 100.0 + i as f64;
                RawCandle {
                    timestamp_ms: 1_600_000_000_000 + i as i64 * step,
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 5.0,
                }
            })
            .collect())
    }
}

// ── one failing timeframe ───────────────────────────────────────────

#[test]
fn failing_timeframe_becomes_error_row() {
    let venue = StubVenue::new(&[Timeframe::Week1]);
    let report = run_analysis(&config(&["1d", "1w", "4h"]), &venue, now()).unwrap();

    assert_eq!(report.rows.len(), 3);
    let labels: Vec<_> = report.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["1d", "1w", "4h"]);

    let failed = report.row("1w").unwrap();
    assert_eq!(failed.status, RowStatus::Error);
    assert_eq!(failed.trend, TrendLabel::NotAvailable);
    assert!(failed.error.as_deref().unwrap().contains("maintenance"));
    assert_eq!(failed.last_close, None);

    for label in ["1d", "4h"] {
        let row = report.row(label).unwrap();
        assert_eq!(row.status, RowStatus::Ok);
        assert_eq!(row.trend, TrendLabel::Up);
        assert_eq!(row.last_close, Some(349.0));
        assert_eq!(row.bars, 250);
        assert!(row.dataset_hash.is_some());
    }

    // 1 + 2 retries + 1
    assert_eq!(venue.calls.load(Ordering::SeqCst), 4);
    assert!(report.has_errors());
    assert!(report.any_data());
}

#[test]
fn all_failing_still_yields_a_report() {
    let venue = StubVenue::new(&[Timeframe::Day1, Timeframe::Hour1]);
    let report = run_analysis(&config(&["1d", "1h"]), &venue, now()).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert!(!report.any_data());
    assert!(report.signals.is_empty());
}

#[test]
fn cycle_phase_uses_injected_year() {
    let venue = StubVenue::new(&[]);
    let report = run_analysis(&config(&["1d"]), &venue, now()).unwrap();
    assert_eq!(report.cycle.position, 3);
    assert_eq!(report.cycle.label, "Up (year 3)");
    assert_eq!(report.cycle.bias, Bias::LongPreferred);
    assert_eq!(report.generated_at, now());

    let mut cfg = config(&["1d"]);
    cfg.cycle_reference_year = 2025;
    let report = run_analysis(&cfg, &venue, now()).unwrap();
    assert_eq!(report.cycle.label, "Down (bottom year)");
}

#[test]
fn invalid_config_fails_before_io() {
    let venue = StubVenue::new(&[]);
    let mut cfg = config(&["1d", "2d"]);
    let err = run_analysis(&cfg, &venue, now()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTimeframe(_)));

    cfg = config(&["1d"]);
    cfg.max_retries = 0;
    assert!(run_analysis(&cfg, &venue, now()).is_err());
    assert_eq!(venue.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn short_history_reports_insufficient_data() {
    let venue = StubVenue::new(&[]);
    let mut cfg = config(&["1d"]);
    cfg.limit = 50;
    let report = run_analysis(&cfg, &venue, now()).unwrap();
    let row = report.row("1d").unwrap();
    assert_eq!(row.status, RowStatus::Ok);
    assert!(row.insufficient_history);
    assert_eq!(row.trend, TrendLabel::InsufficientData);
    assert_eq!(row.sma200, None);
}

// ── Parallel mode ────────────────────────────────────────────────────

#[test]
fn parallel_matches_sequential() {
    let codes = ["1M", "1w", "1d", "4h", "1h"];
    let sequential = run_analysis(&config(&codes), &StubVenue::new(&[Timeframe::Day1]), now())
        .unwrap();

    let mut cfg = config(&codes);
    cfg.execution = ExecutionMode::Parallel;
    let parallel = run_analysis(&cfg, &StubVenue::new(&[Timeframe::Day1]), now()).unwrap();

    assert_eq!(sequential.rows, parallel.rows);
    assert_eq!(sequential.signals, parallel.signals);
}

// ── Signals and pacing ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Shape {
    Rising,
    /// Accelerating decline, then a jump: MACD golden cross below zero on the last bar.
    CrossUp,
    /// `CrossUp` mirrored around 400: MACD dead cross above zero on the last bar.
    CrossDown,
}

impl Shape {
    fn closes(self, n: usize) -> Vec<f64> {
        let mut down: Vec<f64> = (0..n - 1).map(|i| 300.0 - 0.002 * (i * i) as f64).collect();
        let last = down[n - 2] + 5.0;
        down.push(last);
        match self {
            Shape::Rising => (0..n).map(|i| 100.0 + i as f64).collect(),
            Shape::CrossUp => down,
            Shape::CrossDown => down.into_iter().map(|c| 400.0 - c).collect(),
        }
    }
}

/// Serves a fixed close shape per timeframe and records when each request arrived.
struct ShapedVenue {
    shapes: Vec<(Timeframe, Shape)>,
    calls: Mutex<Vec<(Timeframe, Instant)>>,
}

impl ShapedVenue {
    fn new(shapes: &[(Timeframe, Shape)]) -> Self {
        Self {
            shapes: shapes.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_time(&self, timeframe: Timeframe) -> Instant {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(tf, _)| *tf == timeframe)
            .map(|(_, at)| *at)
            .unwrap()
    }
}

impl Venue for ShapedVenue {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Synthetic
    }

    fn fetch_ohlcv(
        &self,
        _symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawCandle>, VenueError> {
        self.calls.lock().unwrap().push((timeframe, Instant::now()));
        let shape = self
            .shapes
            .iter()
            .find(|(tf, _)| *tf == timeframe)
            .map(|(_, s)| *s)
            .unwrap_or(Shape::Rising);
        let step = timeframe.minutes() * 60_000;
        Ok(shape
            .closes(limit)
            .into_iter()
            .enumerate()
            .map(|(i, close)| RawCandle {
                timestamp_ms: 1_600_000_000_000 + i as i64 * step,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 5.0,
            })
            .collect())
    }
}

fn shaped() -> ShapedVenue {
    ShapedVenue::new(&[
        (Timeframe::Week1, Shape::Rising),
        (Timeframe::Hour4, Shape::CrossDown),
        (Timeframe::Day1, Shape::CrossUp),
    ])
}

#[test]
fn signals_follow_configured_timeframe_order() {
    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let mut cfg = config(&["1w", "4h", "1d"]);
        cfg.execution = mode;
        let report = run_analysis(&cfg, &shaped(), now()).unwrap();

        let got: Vec<(&str, SignalKind)> = report
            .signals
            .iter()
            .map(|s| (s.timeframe.as_str(), s.kind))
            .collect();
        assert_eq!(
            got,
            vec![
                ("4h", SignalKind::MacdDeadCrossHigh),
                ("1d", SignalKind::MacdGoldenCrossLow),
            ],
            "{mode:?}"
        );
        assert_eq!(report.signals[1].message, "[1d] MACD golden cross (low zone)");
        assert_eq!(report.row("1d").unwrap().trend, TrendLabel::Down);
        assert!(report.row("1d").unwrap().macd.unwrap() < 0.0);
    }
}

#[test]
fn sequential_paces_between_requests_only() {
    let delay = Duration::from_millis(150);
    let mut cfg = config(&["1w", "4h", "1d"]);
    cfg.request_delay_ms = delay.as_millis() as u64;
    let venue = shaped();

    let report = run_analysis(&cfg, &venue, now()).unwrap();
    let finished = Instant::now();
    assert_eq!(report.rows.len(), 3);

    let week = venue.call_time(Timeframe::Week1);
    let four_hour = venue.call_time(Timeframe::Hour4);
    let day = venue.call_time(Timeframe::Day1);
    assert!(four_hour.duration_since(week) >= delay);
    assert!(day.duration_since(four_hour) >= delay);
    // No trailing sleep after the last request.
    assert!(finished.duration_since(day) < delay);
}

#[test]
fn parallel_staggers_requests_by_position() {
    let delay = Duration::from_millis(100);
    let mut cfg = config(&["1w", "4h", "1d"]);
    cfg.request_delay_ms = delay.as_millis() as u64;
    cfg.execution = ExecutionMode::Parallel;
    let venue = shaped();

    let started = Instant::now();
    run_analysis(&cfg, &venue, now()).unwrap();

    for (i, tf) in [Timeframe::Week1, Timeframe::Hour4, Timeframe::Day1]
        .into_iter()
        .enumerate()
    {
        assert!(venue.call_time(tf).duration_since(started) >= delay * i as u32);
    }
}

// ── Synthetic venue + cache ──────────────────────────────────────────

#[test]
fn synthetic_run_is_deterministic() {
    let mut cfg = config(&["1d", "4h"]);
    cfg.exchange = ExchangeId::Synthetic;
    let venue = SyntheticVenue::new(cfg.synthetic_seed, now());

    let a = run_analysis(&cfg, &venue, now()).unwrap();
    let b = run_analysis(&cfg, &venue, now()).unwrap();
    assert_eq!(a, b);
    assert!(a.rows.iter().all(|r| r.status == RowStatus::Ok));
}

#[test]
fn cached_venue_serves_second_round() {
    let cfg = config(&["1d", "4h"]);
    let venue = CachingVenue::new(StubVenue::new(&[]), DEFAULT_CACHE_TTL);

    let first = run_analysis(&cfg, &venue, now()).unwrap();
    let second = run_analysis(&cfg, &venue, now()).unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(venue.inner().calls.load(Ordering::SeqCst), 2);
    assert_eq!(venue.stats().hits, 2);
}

// ── Properties ───────────────────────────────────────────────────────

fn arb_plan() -> impl Strategy<Value = Vec<(Timeframe, bool)>> {
    prop::sample::subsequence(Timeframe::ALL.to_vec(), 1..6)
        .prop_flat_map(|tfs| {
            let n = tfs.len();
            (Just(tfs), prop::collection::vec(any::<bool>(), n))
        })
        .prop_map(|(tfs, fails)| tfs.into_iter().zip(fails).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Row count and order always match the configuration.
    #[test]
    fn one_row_per_configured_timeframe(plan in arb_plan()) {
        let failing: Vec<Timeframe> = plan.iter().filter(|(_, f)| *f).map(|(t, _)| *t).collect();
        let codes: Vec<&str> = plan.iter().map(|(t, _)| t.code()).collect();
        let mut cfg = config(&codes);
        cfg.max_retries = 1;

        let report = run_analysis(&cfg, &StubVenue::new(&failing), now()).unwrap();

        prop_assert_eq!(report.rows.len(), plan.len());
        for (row, (tf, fails)) in report.rows.iter().zip(&plan) {
            prop_assert_eq!(row.timeframe, *tf);
            prop_assert_eq!(row.status == RowStatus::Error, *fails);
        }
    }
}
