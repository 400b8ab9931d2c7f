//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over candle sources (Binance REST, CSV
//! import, synthetic) so the runner can swap implementations and tests can
//! run offline.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use hybridlab_core::Candle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider rejected request: {code} {message}")]
    Api { code: i64, message: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Candle interval, using exchange notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::OneDay,
        Interval::FourHours,
        Interval::OneHour,
        Interval::FifteenMinutes,
        Interval::OneWeek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1w",
        }
    }

    /// Spacing between consecutive candle open times.
    pub fn duration(self) -> Duration {
        match self {
            Interval::FifteenMinutes => Duration::minutes(15),
            Interval::OneHour => Duration::hours(1),
            Interval::FourHours => Duration::hours(4),
            Interval::OneDay => Duration::days(1),
            Interval::OneWeek => Duration::weeks(1),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown interval '{s}' (valid: 1d, 4h, 1h, 15m, 1w)"))
    }
}

/// Result of a successful fetch for a single symbol.
///
/// Candles are raw: ordering and finiteness are checked when the series is
/// built, not here.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub interval: Interval,
    pub candles: Vec<Candle>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Binance,
    CsvImport,
    Synthetic,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Binance => "binance",
            DataSource::CsvImport => "csv_import",
            DataSource::Synthetic => "synthetic",
        }
    }
}

/// Trait for candle providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the newest `limit` candles for `symbol` at `interval`.
    fn fetch(&self, symbol: &str, interval: Interval, limit: usize)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
