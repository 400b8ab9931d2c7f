//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single asset over one interval.
///
/// `timestamp` is the interval's open time. Timestamps are only meaningful
/// relative to other candles of the same series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if all five numeric fields are finite (no NaN, no infinity).
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    ///
    /// Not enforced by `OhlcvSeries`; providers use it to flag suspicious rows.
    pub fn is_sane(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}
