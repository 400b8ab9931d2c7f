//! Indicator frame: a candle series plus its derived indicator columns.
//!
//! Frames are built wholesale from a series and never patched: every
//! parameter change produces a new frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, OhlcvSeries};
use crate::indicators::{macd_lines, Indicator, Rsi};

/// Window sizes for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorParams {
    /// Bars needed before every column is defined.
    pub fn warmup(&self) -> usize {
        let macd = self.macd_fast.max(self.macd_slow) + self.macd_signal - 2;
        self.rsi_window.max(macd)
    }
}

/// One row of an indicator frame. `None` means undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub candle: Candle,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
}

/// Candle series extended with `rsi`, `macd`, `macd_signal`, and
/// `macd_histogram` columns. Undefined values are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    series: OhlcvSeries,
    rsi: Vec<f64>,
    macd: Vec<f64>,
    macd_signal: Vec<f64>,
    macd_histogram: Vec<f64>,
}

impl IndicatorFrame {
    pub fn series(&self) -> &OhlcvSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.series.timestamps()
    }

    pub fn rsi(&self) -> &[f64] {
        &self.rsi
    }

    pub fn macd(&self) -> &[f64] {
        &self.macd
    }

    pub fn macd_signal(&self) -> &[f64] {
        &self.macd_signal
    }

    pub fn macd_histogram(&self) -> &[f64] {
        &self.macd_histogram
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let candle = *self.series.candles().get(index)?;
        Some(IndicatorRow {
            candle,
            rsi: defined(self.rsi[index]),
            macd: defined(self.macd[index]),
            macd_signal: defined(self.macd_signal[index]),
            macd_histogram: defined(self.macd_histogram[index]),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }
}

pub(crate) fn defined(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

/// Compute every indicator column over a series' close prices.
pub fn compute_indicators(series: &OhlcvSeries, params: &IndicatorParams) -> IndicatorFrame {
    let closes = series.closes();
    let rsi = Rsi::new(params.rsi_window).compute(&closes);
    let macd = macd_lines(
        &closes,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );

    IndicatorFrame {
        series: series.clone(),
        rsi,
        macd: macd.macd,
        macd_signal: macd.signal,
        macd_histogram: macd.histogram,
    }
}
