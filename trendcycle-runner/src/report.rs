//! The typed analysis report consumed by presentation and export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trendcycle_core::analysis::{CyclePhase, Signal, TrendLabel};
use trendcycle_core::data::ExchangeId;
use trendcycle_core::domain::Timeframe;
use trendcycle_core::indicators::IndicatorFrame;

/// Bumped whenever the serialized report layout changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Ok,
    Error,
}

/// One line of the multi-timeframe summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub timeframe: Timeframe,
    pub status: RowStatus,
    pub last_close: Option<f64>,
    pub sma200: Option<f64>,
    pub macd: Option<f64>,
    pub trend: TrendLabel,
    pub bars: usize,
    pub insufficient_history: bool,
    /// BLAKE3 of the fetched bars.
    pub dataset_hash: Option<String>,
    pub error: Option<String>,
}

impl SummaryRow {
    pub fn ok(label: &str, timeframe: Timeframe, frame: &IndicatorFrame, trend: TrendLabel) -> Self {
        let last = frame.last();
        Self {
            label: label.to_string(),
            timeframe,
            status: RowStatus::Ok,
            last_close: last.map(|row| row.bar.close),
            sma200: last.and_then(|row| row.derived.sma200),
            macd: last.and_then(|row| row.derived.macd),
            trend,
            bars: frame.len(),
            insufficient_history: frame.insufficient_history(),
            dataset_hash: Some(frame.series().content_hash()),
            error: None,
        }
    }

    pub fn error(label: &str, timeframe: Timeframe, message: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            timeframe,
            status: RowStatus::Error,
            last_close: None,
            sma200: None,
            macd: None,
            trend: TrendLabel::NotAvailable,
            bars: 0,
            insufficient_history: false,
            dataset_hash: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RowStatus::Ok
    }
}

/// Immutable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub symbol: String,
    pub exchange: ExchangeId,
    pub generated_at: DateTime<Utc>,
    /// One row per configured timeframe, in configured order.
    pub rows: Vec<SummaryRow>,
    /// Signals from every timeframe, in timeframe then rule order.
    pub signals: Vec<Signal>,
    pub cycle: CyclePhase,
}

impl AnalysisReport {
    pub fn row(&self, label: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().filter(|r| !r.is_ok())
    }

    pub fn has_errors(&self) -> bool {
        self.failed_rows().next().is_some()
    }

    /// True when at least one timeframe was fetched.
    pub fn any_data(&self) -> bool {
        self.rows.iter().any(SummaryRow::is_ok)
    }
}
