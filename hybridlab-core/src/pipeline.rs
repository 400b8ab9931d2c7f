//! End-to-end signal pipeline.
//!
//! ```text
//! series ─┬─ indicators ─ classify(daily) ───────────────────────┐
//!         └─ resample ─ indicators ─ classify(weekly) ─ align ───┴─ fuse ─ hybrid
//! ```
//!
//! Every stage is a pure function returning a new value; nothing is patched
//! in place. A parameter change means re-running the whole pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::align;
use crate::classify::classify;
use crate::config::{ConfigError, PipelineConfig};
use crate::domain::{Candle, HybridSignalSeries, OhlcvSeries, SeriesError, Signal, SignalSeries};
use crate::fingerprint::{config_hash, dataset_hash, signals_hash, RunFingerprint};
use crate::frame::{compute_indicators, IndicatorFrame};
use crate::fusion::{fuse, FusionError};
use crate::resample::resample;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input series: {0}")]
    Series(#[from] SeriesError),

    #[error("fusion failed: {0}")]
    Fusion(#[from] FusionError),
}

/// Everything a run produces. Read-only for consumers.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub config: PipelineConfig,
    /// Input after `history_limit` truncation.
    pub series: OhlcvSeries,
    pub fine_frame: IndicatorFrame,
    pub coarse_frame: IndicatorFrame,
    pub fine_signals: SignalSeries,
    pub coarse_signals: SignalSeries,
    pub coarse_aligned: SignalSeries,
    pub hybrid: HybridSignalSeries,
    pub fingerprint: RunFingerprint,
}

/// One exported row: candle, fine indicators, and the three signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRow {
    pub timestamp: DateTime<Utc>,
    pub candle: Candle,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub daily_signal: Signal,
    pub weekly_signal: Signal,
    pub trade_signal: Signal,
}

/// Signal counts for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub bars: usize,
    pub warmup_bars: usize,
    pub coarse_bars: usize,
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
    /// Most recent hybrid BUY or SELL.
    pub latest_actionable: Option<(DateTime<Utc>, Signal)>,
}

/// Run the full pipeline on an already-validated series.
pub fn run_pipeline(
    series: &OhlcvSeries,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    let series = series.tail(config.history_limit);
    let params = config.indicator_params();

    let fine_frame = compute_indicators(&series, &params);
    let fine_signals = classify(&fine_frame, &config.daily_thresholds());
    tracing::debug!(bars = fine_frame.len(), "fine timeframe classified");

    let coarse_series = resample(&series, config.coarse_bucket);
    let coarse_frame = compute_indicators(&coarse_series, &params);
    let coarse_signals = classify(&coarse_frame, &config.weekly_thresholds());
    tracing::debug!(
        bars = coarse_frame.len(),
        bucket = %config.coarse_bucket,
        "coarse timeframe classified"
    );

    let fine_index = series.timestamps();
    let coarse_aligned = align(&coarse_signals, &fine_index);
    let hybrid = fuse(&fine_signals, &coarse_aligned)?;

    let fingerprint = RunFingerprint {
        config_hash: config_hash(config),
        dataset_hash: dataset_hash(&series),
        output_hash: signals_hash(&hybrid),
    };

    Ok(PipelineOutput {
        config: config.clone(),
        series,
        fine_frame,
        coarse_frame,
        fine_signals,
        coarse_signals,
        coarse_aligned,
        hybrid,
        fingerprint,
    })
}

/// Validate raw candles, then run the pipeline.
///
/// Configuration is checked before the series, and both before any
/// indicator is computed.
pub fn run_pipeline_on_candles(
    candles: Vec<Candle>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;
    let series = OhlcvSeries::new(candles)?;
    run_pipeline(&series, config)
}

impl PipelineOutput {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<SignalRow> {
        let ind = self.fine_frame.row(index)?;
        Some(SignalRow {
            timestamp: ind.candle.timestamp,
            candle: ind.candle,
            rsi: ind.rsi,
            macd: ind.macd,
            macd_signal: ind.macd_signal,
            macd_histogram: ind.macd_histogram,
            daily_signal: self.fine_signals.get(index)?,
            weekly_signal: self.coarse_aligned.get(index)?,
            trade_signal: self.hybrid.get(index)?,
        })
    }

    /// All rows in timestamp order.
    pub fn rows(&self) -> impl Iterator<Item = SignalRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// The newest `n` rows, oldest first.
    pub fn latest_rows(&self, n: usize) -> Vec<SignalRow> {
        let start = self.len().saturating_sub(n);
        (start..self.len()).filter_map(|i| self.row(i)).collect()
    }

    /// Rows whose timestamp falls on `date` (UTC). Intraday series can have several.
    pub fn rows_on(&self, date: NaiveDate) -> Vec<SignalRow> {
        self.rows()
            .filter(|r| r.timestamp.date_naive() == date)
            .collect()
    }

    pub fn summary(&self) -> SignalSummary {
        let warmup = self.config.indicator_params().warmup();
        SignalSummary {
            bars: self.len(),
            warmup_bars: warmup.min(self.len()),
            coarse_bars: self.coarse_frame.len(),
            buy: self.hybrid.count(Signal::Buy),
            sell: self.hybrid.count(Signal::Sell),
            neutral: self.hybrid.count(Signal::Neutral),
            latest_actionable: self
                .hybrid
                .iter()
                .filter(|(_, s)| s.is_actionable())
                .last(),
        }
    }
}
