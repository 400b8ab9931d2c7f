//! CSV candle import.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Extra columns are
//! ignored, so a signals export can be read back as input.
//!
//! Accepted timestamp forms, all taken as UTC:
//! - RFC 3339 (`2024-01-01T00:00:00Z`)
//! - `YYYY-MM-DD HH:MM:SS` (pandas default)
//! - `YYYY-MM-DD`
//! - epoch milliseconds

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use hybridlab_core::Candle;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult, Interval};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse a timestamp cell.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN).and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Read candles from any CSV source, in file order.
pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();

    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            // +2: header line and 1-based numbering
            DataError::ValidationError(format!(
                "line {}: unrecognized timestamp '{}'",
                i + 2,
                row.timestamp
            ))
        })?;
        candles.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    Ok(candles)
}

/// Provider backed by a single CSV file.
///
/// The file has no symbol or interval column; the caller's values are echoed
/// back in the `FetchResult`. `limit` keeps the last rows of the file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, symbol: &str, interval: Interval, limit: usize) -> Result<FetchResult, DataError> {
        let file = std::fs::File::open(&self.path)?;
        let mut candles = read_candles(file)?;
        let start = candles.len().saturating_sub(limit);
        candles.drain(..start);
        tracing::info!(path = %self.path.display(), candles = candles.len(), "read candles from csv");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval,
            candles,
            source: DataSource::CsvImport,
        })
    }
}
