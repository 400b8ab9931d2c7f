//! Validated, immutable OHLCV series.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::candle::Candle;

/// Contract violations in a candle series supplied by a data source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("duplicate timestamp {timestamp} at index {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("timestamp {timestamp} at index {index} precedes previous timestamp {previous}")]
    NonMonotonic {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("non-finite value in candle at index {index} ({timestamp})")]
    NonFinite {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Ordered candle sequence with unique, strictly increasing timestamps.
///
/// Gaps between candles are allowed and never interpolated. The only way to
/// build a series is through [`OhlcvSeries::new`], so every instance upholds
/// the ordering invariant. An empty series is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OhlcvSeries {
    candles: Vec<Candle>,
}

impl OhlcvSeries {
    /// Validate and wrap a candle vector.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, candle) in candles.iter().enumerate() {
            if !candle.is_finite() {
                return Err(SeriesError::NonFinite {
                    index,
                    timestamp: candle.timestamp,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = candles[index - 1].timestamp;
            if candle.timestamp == previous {
                return Err(SeriesError::DuplicateTimestamp {
                    index,
                    timestamp: candle.timestamp,
                });
            }
            if candle.timestamp < previous {
                return Err(SeriesError::NonMonotonic {
                    index,
                    timestamp: candle.timestamp,
                    previous,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The newest `n` candles as a new series (the whole series if shorter).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.candles.len().saturating_sub(n);
        // Any contiguous slice of a valid series is valid.
        Self {
            candles: self.candles[start..].to_vec(),
        }
    }

    /// Build a series from candles already known to be ordered and finite.
    ///
    /// Used by the resampler, whose output is ordered by construction.
    pub(crate) fn from_ordered(candles: Vec<Candle>) -> Self {
        debug_assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { candles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candle_at(day: i64, close: f64) -> Candle {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle {
            timestamp: base + Duration::days(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn accepts_strictly_increasing_with_gaps() {
        let series =
            OhlcvSeries::new(vec![candle_at(0, 1.0), candle_at(1, 2.0), candle_at(5, 3.0)])
                .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn accepts_empty() {
        let series = OhlcvSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = OhlcvSeries::new(vec![candle_at(0, 1.0), candle_at(0, 2.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateTimestamp { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order() {
        let err = OhlcvSeries::new(vec![candle_at(0, 1.0), candle_at(2, 2.0), candle_at(1, 3.0)])
            .unwrap_err();
        assert!(matches!(err, SeriesError::NonMonotonic { index: 2, .. }));
    }

    #[test]
    fn rejects_non_finite() {
        let mut bad = candle_at(1, 2.0);
        bad.high = f64::NAN;
        let err = OhlcvSeries::new(vec![candle_at(0, 1.0), bad]).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn tail_keeps_newest() {
        let series = OhlcvSeries::new((0..10).map(|d| candle_at(d, d as f64)).collect()).unwrap();
        let tail = series.tail(3);
        assert_eq!(tail.closes(), vec![7.0, 8.0, 9.0]);
        assert_eq!(series.tail(100).len(), 10);
        assert!(series.tail(0).is_empty());
    }
}
