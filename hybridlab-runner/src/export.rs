//! Export: signal table CSV, candle CSV, and run summary JSON.
//!
//! CSV timestamps are RFC 3339 UTC. Undefined indicator values are written as
//! empty cells, never as zero or `NaN`, so the signal table reads back cleanly
//! through the CSV importer.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use hybridlab_core::{OhlcvSeries, PipelineOutput};

use crate::runner::{RunSummary, SCHEMA_VERSION};

// ─── CSV export ─────────────────────────────────────────────────────

pub const SIGNAL_COLUMNS: [&str; 12] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "rsi",
    "macd",
    "macd_signal",
    "daily_sig",
    "weekly_sig",
    "trade_signal",
];

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// One row per fine bar with candle, indicators, and all three signals.
pub fn export_signals_csv(output: &PipelineOutput) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SIGNAL_COLUMNS)?;

    for row in output.rows() {
        let c = row.candle;
        wtr.write_record([
            ts(row.timestamp),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
            cell(row.rsi),
            cell(row.macd),
            cell(row.macd_signal),
            row.daily_signal.to_string(),
            row.weekly_signal.to_string(),
            row.trade_signal.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Raw candles in the importer's format.
pub fn write_candles_csv(series: &OhlcvSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&SIGNAL_COLUMNS[..6])?;
    for c in series.candles() {
        wtr.write_record([
            ts(c.timestamp),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize RunSummary to JSON")
}

/// Deserialize a `RunSummary`, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize RunSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}
