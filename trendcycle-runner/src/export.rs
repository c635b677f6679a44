//! Reporting and export: JSON, CSV, and Markdown artifacts for a report.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: summary rows and the signal list for spreadsheets
//! - **Markdown**: human-readable report
//!
//! Persisted reports carry `schema_version`; newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use trendcycle_core::analysis::Signal;

use crate::report::{AnalysisReport, RowStatus, SummaryRow, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn report_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn report_from_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Columns: label, timeframe, status, last_close, sma200, macd, trend, bars,
/// insufficient_history, dataset_hash, error
pub fn rows_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "label",
        "timeframe",
        "status",
        "last_close",
        "sma200",
        "macd",
        "trend",
        "bars",
        "insufficient_history",
        "dataset_hash",
        "error",
    ])?;

    for r in rows {
        let status = match r.status {
            RowStatus::Ok => "ok",
            RowStatus::Error => "error",
        };
        wtr.write_record([
            r.label.as_str(),
            r.timeframe.code(),
            status,
            opt(r.last_close).as_str(),
            opt(r.sma200).as_str(),
            opt(r.macd).as_str(),
            r.trend.description(),
            r.bars.to_string().as_str(),
            if r.insufficient_history { "true" } else { "false" },
            r.dataset_hash.as_deref().unwrap_or(""),
            r.error.as_deref().unwrap_or(""),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: timeframe, kind, message
pub fn signals_csv(signals: &[Signal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timeframe", "kind", "message"])?;
    for s in signals {
        wtr.write_record([
            s.timeframe.as_str(),
            format!("{:?}", s.kind).as_str(),
            s.message.as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn generate_markdown(report: &AnalysisReport) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str(&format!("# {} analysis\n\n", report.symbol));
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Exchange | {} |\n", report.exchange));
    md.push_str(&format!(
        "| Generated | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| Cycle phase | {} |\n", report.cycle.label));
    md.push_str(&format!("| Strategic bias | {} |\n\n", report.cycle.bias));

    md.push_str("## Multi-timeframe summary\n\n");
    md.push_str("| Timeframe | Close | Trend | SMA200 | MACD | Bars |\n");
    md.push_str("| --- | ---: | --- | ---: | ---: | ---: |\n");
    for r in &report.rows {
        if let Some(err) = &r.error {
            md.push_str(&format!("| {} | N/A | error: {} | N/A | N/A | 0 |\n", r.label, err));
            continue;
        }
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            r.label,
            or_na(r.last_close),
            r.trend,
            or_na(r.sma200),
            or_na(r.macd),
            r.bars
        ));
    }

    md.push_str("\n## Signals\n\n");
    if report.signals.is_empty() {
        md.push_str("No high-probability signals detected.\n");
    } else {
        for s in &report.signals {
            md.push_str(&format!("- {}\n", s.message));
        }
    }

    md
}

fn or_na(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "N/A".to_string())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a report.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing
/// `report.json`, `summary.csv`, `signals.csv` and `report.md`. The
/// timestamp is the report's own generation instant. Returns the directory.
pub fn save_report(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.symbol.replace(['/', '\\', ':'], "-"),
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), report_json(report)?)?;
    std::fs::write(run_dir.join("summary.csv"), rows_csv(&report.rows)?)?;
    std::fs::write(run_dir.join("signals.csv"), signals_csv(&report.signals)?)?;
    std::fs::write(run_dir.join("report.md"), generate_markdown(report))?;

    Ok(run_dir)
}

/// Load a report from a directory written by `save_report`.
pub fn load_report(dir: &Path) -> Result<AnalysisReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    report_from_json(&json)
}
