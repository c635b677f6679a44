//! TrendCycle CLI: multi-timeframe trend, signal and cycle analysis.
//!
//! Commands:
//! - `analyze`: run the analysis once, print the summary, optionally save artifacts
//! - `watch`: re-run the analysis on an interval through a TTL cache
//! - `cycle`: print the four-year cycle phase for a year

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use trendcycle_core::analysis::{classify_cycle, CyclePhase, DEFAULT_REFERENCE_YEAR};
use trendcycle_runner::{
    build_venue, report_json, run_analysis, save_report, AnalysisConfig, AnalysisReport,
    CachingVenue, ExecutionMode, RowStatus, DEFAULT_CACHE_TTL,
};

#[derive(Parser)]
#[command(
    name = "trendcycle",
    about = "TrendCycle CLI: multi-timeframe crypto trend and cycle analysis"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every configured timeframe once.
    Analyze {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Print the report as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Save report.json, summary.csv, signals.csv and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Re-run the analysis periodically, serving repeats from a TTL cache.
    Watch {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Seconds between rounds.
        #[arg(long, default_value_t = 300)]
        every: u64,

        /// Number of rounds to run.
        #[arg(long, default_value_t = 3)]
        rounds: u32,

        /// Cache lifetime in seconds.
        #[arg(long, default_value_t = DEFAULT_CACHE_TTL.as_secs())]
        cache_ttl: u64,
    },
    /// Print the four-year cycle phase.
    Cycle {
        /// Year to classify. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// Down year the cycle counts from.
        #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
        reference_year: i32,

        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Flags shared by `analyze` and `watch`; each overrides the config file.
#[derive(Args)]
struct AnalysisArgs {
    /// Path to a TOML config file. Defaults to BTC/USDT on Binance.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol as BASE/QUOTE (e.g. ETH/USDT).
    #[arg(long)]
    symbol: Option<String>,

    /// Exchange: binance, bybit, bitget, synthetic.
    #[arg(long)]
    exchange: Option<String>,

    /// Bars requested per timeframe.
    #[arg(long)]
    limit: Option<usize>,

    /// Attempts per fetch.
    #[arg(long)]
    retries: Option<u32>,

    /// Pacing between venue requests, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Fetch timeframes in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl AnalysisArgs {
    fn load_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AnalysisConfig::default_btc(),
        };

        if let Some(symbol) = &self.symbol {
            config.symbol = symbol.clone();
        }
        if let Some(exchange) = &self.exchange {
            config.set_exchange(exchange)?;
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.request_delay_ms = delay_ms;
        }
        if self.parallel {
            config.execution = ExecutionMode::Parallel;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            analysis,
            json,
            output_dir,
        } => run_analyze(&analysis, json, output_dir),
        Commands::Watch {
            analysis,
            every,
            rounds,
            cache_ttl,
        } => run_watch(&analysis, every, rounds, cache_ttl),
        Commands::Cycle {
            year,
            reference_year,
            json,
        } => run_cycle(year, reference_year, json),
    }
}

/// Logs go to stderr; stdout carries the report.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_analyze(args: &AnalysisArgs, json: bool, output_dir: Option<PathBuf>) -> Result<()> {
    let config = args.load_config()?;
    let now = Utc::now();
    let venue = build_venue(&config, now)?;

    let report = run_analysis(&config, venue.as_ref(), now)?;

    if json {
        println!("{}", report_json(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_report(&report, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    if !report.any_data() {
        bail!("no timeframe could be fetched for {}", report.symbol);
    }
    Ok(())
}

fn run_watch(args: &AnalysisArgs, every: u64, rounds: u32, cache_ttl: u64) -> Result<()> {
    if rounds == 0 {
        bail!("--rounds must be >= 1");
    }
    let config = args.load_config()?;
    let venue = CachingVenue::new(
        build_venue(&config, Utc::now())?,
        Duration::from_secs(cache_ttl),
    );

    for round in 1..=rounds {
        let now = Utc::now();
        tracing::info!(round, rounds, "watch round");
        let report = run_analysis(&config, &venue, now)?;
        print_report(&report);

        let stats = venue.stats();
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "cache stats"
        );

        if round < rounds {
            std::thread::sleep(Duration::from_secs(every));
        }
    }
    Ok(())
}

fn run_cycle(year: Option<i32>, reference_year: i32, json: bool) -> Result<()> {
    let year = year.unwrap_or_else(|| Utc::now().year());
    let phase = classify_cycle(year, reference_year);
    if json {
        println!("{}", serde_json::to_string_pretty(&phase)?);
    } else {
        print_cycle(year, &phase);
    }
    Ok(())
}

fn print_cycle(year: i32, phase: &CyclePhase) {
    println!("Year:           {year}");
    println!("Cycle phase:    {} (position {}/3)", phase.label, phase.position);
    println!("Strategic bias: {}", phase.bias);
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "N/A".to_string())
}

fn print_report(report: &AnalysisReport) {
    println!();
    println!("=== {} on {} ===", report.symbol, report.exchange);
    println!(
        "Generated:      {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_cycle(report.generated_at.year(), &report.cycle);

    println!();
    println!("--- Multi-timeframe summary ---");
    println!(
        "{:<6} {:>14} {:<40} {:>14} {:>12}",
        "TF", "Close", "Trend", "SMA200", "MACD"
    );
    for row in &report.rows {
        match row.status {
            RowStatus::Ok => println!(
                "{:<6} {:>14} {:<40} {:>14} {:>12}",
                row.label,
                fmt_opt(row.last_close),
                row.trend.to_string(),
                fmt_opt(row.sma200),
                fmt_opt(row.macd)
            ),
            RowStatus::Error => println!(
                "{:<6} error: {}",
                row.label,
                row.error.as_deref().unwrap_or("unknown")
            ),
        }
    }

    println!();
    println!("--- Signals ---");
    if report.signals.is_empty() {
        println!("No high-probability signals detected.");
    } else {
        for signal in &report.signals {
            let marker = if signal.kind.is_long() { "BUY " } else { "SELL" };
            println!("{marker} {}", signal.message);
        }
    }

    println!();
    println!("Reminder: the trend is your friend; do not fight the strategic bias.");
}
