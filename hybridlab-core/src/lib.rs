//! HybridLab Core: multi-timeframe RSI/MACD signal pipeline.
//!
//! This crate holds everything that does not touch the network or disk:
//! - Domain types (candles, validated series, signals)
//! - Causal indicators (Wilder RSI, EMA, MACD)
//! - Calendar resampling and strictly-causal alignment
//! - Per-timeframe classification and hybrid fusion
//! - Configuration, validation, and run fingerprints

pub mod align;
pub mod classify;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod frame;
pub mod fusion;
pub mod indicators;
pub mod pipeline;
pub mod resample;

pub use align::{align, latest_at_or_before};
pub use classify::{classify, classify_row, classify_values, Thresholds};
pub use config::{ConfigError, PipelineConfig};
pub use domain::{Candle, HybridSignalSeries, OhlcvSeries, SeriesError, Signal, SignalSeries};
pub use fingerprint::RunFingerprint;
pub use frame::{compute_indicators, IndicatorFrame, IndicatorParams, IndicatorRow};
pub use fusion::{fuse, fuse_one, FusionError};
pub use pipeline::{
    run_pipeline, run_pipeline_on_candles, PipelineError, PipelineOutput, SignalRow,
    SignalSummary,
};
pub use resample::{resample, Bucket};
