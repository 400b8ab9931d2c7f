//! HybridLab CLI: run, fetch, and config commands.
//!
//! Commands:
//! - `run`: load candles, compute daily/weekly/hybrid signals, print and export them
//! - `fetch`: download candles from Binance to CSV
//! - `config`: print or write the default pipeline config

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hybridlab_core::{PipelineConfig, SignalRow};
use hybridlab_runner::export::write_file;
use hybridlab_runner::{
    export_signals_csv, export_summary_json, load_config, load_series, run_signals,
    write_candles_csv, BinanceProvider, CircuitBreaker, CsvProvider, DataProvider, Interval,
    SignalRun, SyntheticProvider,
};

#[derive(Parser)]
#[command(
    name = "hybridlab",
    about = "HybridLab CLI: daily RSI/MACD signals with a weekly veto"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute signals and export them as CSV.
    Run {
        /// Path to a TOML pipeline config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read candles from a CSV file instead of Binance.
        #[arg(long, conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Use a deterministic synthetic random walk instead of Binance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Trading pair.
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        /// Candle interval: 1d, 4h, 1h, 15m, 1w.
        #[arg(long, default_value = "1d")]
        interval: Interval,

        /// Override the config's history_limit.
        #[arg(long)]
        limit: Option<usize>,

        /// Signal CSV path. Defaults to `<symbol>_signals_<interval>.csv`.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write a JSON run summary here.
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Number of most recent rows to print.
        #[arg(long, default_value_t = 20)]
        latest: usize,

        /// Print the rows of one calendar day (YYYY-MM-DD, UTC) instead of the latest rows.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Download candles from Binance and save them as CSV.
    Fetch {
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        #[arg(long, default_value = "1d")]
        interval: Interval,

        /// Number of newest candles to download.
        #[arg(long, default_value_t = 2000)]
        limit: usize,

        #[arg(long)]
        output: PathBuf,
    },
    /// Print the default pipeline config as TOML.
    Config {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            synthetic,
            symbol,
            interval,
            limit,
            output,
            summary,
            latest,
            date,
        } => {
            let mut pipeline_config = match config {
                Some(path) => load_config(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(limit) = limit {
                pipeline_config.history_limit = limit;
            }

            let provider: Box<dyn DataProvider> = match (input, synthetic) {
                (Some(path), _) => Box::new(CsvProvider::new(path)),
                (None, true) => Box::new(SyntheticProvider::default()),
                (None, false) => Box::new(binance()),
            };
            tracing::info!(provider = provider.name(), %symbol, %interval, "starting run");

            let run = run_signals(provider.as_ref(), &symbol, interval, &pipeline_config)
                .with_context(|| format!("signal run for {symbol} {interval} failed"))?;

            match date {
                Some(day) => print_rows(&run.output.rows_on(day)),
                None => print_rows(&run.output.latest_rows(latest)),
            }
            print_summary(&run);

            let output = output.unwrap_or_else(|| default_output(&symbol, interval));
            write_file(&output, &export_signals_csv(&run.output)?)?;
            println!("Signals saved to: {}", output.display());

            if let Some(path) = summary {
                write_file(&path, &export_summary_json(&run.summary())?)?;
                println!("Summary saved to: {}", path.display());
            }
            Ok(())
        }
        Commands::Fetch {
            symbol,
            interval,
            limit,
            output,
        } => run_fetch(&symbol, interval, limit, &output),
        Commands::Config { output } => {
            let toml = PipelineConfig::default().to_toml()?;
            match output {
                Some(path) => write_file(&path, &toml)?,
                None => print!("{toml}"),
            }
            Ok(())
        }
    }
}

fn binance() -> BinanceProvider {
    BinanceProvider::new(Arc::new(CircuitBreaker::default_provider()))
}

fn default_output(symbol: &str, interval: Interval) -> PathBuf {
    PathBuf::from(format!("{}_signals_{interval}.csv", symbol.to_lowercase()))
}

fn run_fetch(symbol: &str, interval: Interval, limit: usize, output: &Path) -> Result<()> {
    let loaded = load_series(&binance(), symbol, interval, limit)
        .with_context(|| format!("failed to fetch {symbol} {interval}"))?;
    for warning in &loaded.warnings {
        eprintln!("WARNING: {warning}");
    }
    write_file(output, &write_candles_csv(&loaded.series)?)?;
    println!(
        "Fetched {} candles for {symbol} ({interval}) to {}",
        loaded.series.len(),
        output.display()
    );
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".into())
}

fn print_rows(rows: &[SignalRow]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }
    println!(
        "{:<20} {:>12} {:>7} {:>10} {:>10} {:>6} {:>6} {:>6}",
        "Timestamp", "Close", "RSI", "MACD", "Signal", "Daily", "Weekly", "Trade"
    );
    println!("{}", "-".repeat(84));
    for r in rows {
        println!(
            "{:<20} {:>12.2} {:>7} {:>10} {:>10} {:>6} {:>6} {:>6}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.candle.close,
            fmt_opt(r.rsi),
            fmt_opt(r.macd),
            fmt_opt(r.macd_signal),
            r.daily_signal.as_str(),
            r.weekly_signal.as_str(),
            r.trade_signal.as_str(),
        );
    }
}

fn print_summary(run: &SignalRun) {
    let s = run.output.summary();
    println!();
    println!(
        "=== {} {} ({}) ===",
        run.loaded.symbol,
        run.loaded.interval,
        run.loaded.source.as_str()
    );
    println!("Bars:          {} ({} warmup)", s.bars, s.warmup_bars);
    println!("Coarse bars:   {} ({})", s.coarse_bars, run.output.config.coarse_bucket);
    println!("BUY / SELL:    {} / {}", s.buy, s.sell);
    println!("NONE:          {}", s.neutral);
    match s.latest_actionable {
        Some((t, signal)) => println!("Latest signal: {signal} at {}", t.format("%Y-%m-%d %H:%M")),
        None => println!("Latest signal: none"),
    }
    println!("Output hash:   {}", &run.output.fingerprint.output_hash[..16]);
    if run.loaded.is_synthetic() {
        println!("NOTE: synthetic data, not market prices");
    }
    for warning in &run.loaded.warnings {
        println!("WARNING: {warning}");
    }
}
