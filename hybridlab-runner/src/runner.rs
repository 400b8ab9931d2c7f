//! Signal runner: wires together loading, the core pipeline, and run metadata.
//!
//! Two entry points:
//! - `run_signals()`: fetches through a provider, then runs. Used by the CLI.
//! - `run_loaded()`: takes an already-loaded series. No I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hybridlab_core::{
    run_pipeline, ConfigError, PipelineConfig, PipelineError, PipelineOutput, RunFingerprint,
    SignalSummary,
};

use crate::data::{DataProvider, DataSource, Interval};
use crate::data_loader::{load_series, LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Current schema version for persisted summaries.
pub const SCHEMA_VERSION: u32 = 1;

/// A completed run: the loaded input and everything the pipeline produced.
#[derive(Debug, Clone)]
pub struct SignalRun {
    pub loaded: LoadedSeries,
    pub output: PipelineOutput,
}

/// Persisted run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub interval: Interval,
    pub source: DataSource,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub config: PipelineConfig,
    pub fingerprint: RunFingerprint,
    pub signals: SignalSummary,
    pub data_quality_warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Fetch `config.history_limit` candles and run the pipeline on them.
///
/// The config is validated before any request is made.
pub fn run_signals(
    provider: &dyn DataProvider,
    symbol: &str,
    interval: Interval,
    config: &PipelineConfig,
) -> Result<SignalRun, RunError> {
    config.validate()?;
    let loaded = load_series(provider, symbol, interval, config.history_limit)?;
    run_loaded(loaded, config)
}

/// Run the pipeline on pre-loaded data.
pub fn run_loaded(loaded: LoadedSeries, config: &PipelineConfig) -> Result<SignalRun, RunError> {
    let output = run_pipeline(&loaded.series, config)?;

    let warmup = config.indicator_params().warmup();
    if output.len() <= warmup {
        tracing::warn!(
            symbol = %loaded.symbol,
            bars = output.len(),
            warmup,
            "too few candles to seed the indicators; every signal is NONE"
        );
    }
    if output.coarse_frame.len() <= warmup {
        tracing::warn!(
            symbol = %loaded.symbol,
            coarse_bars = output.coarse_frame.len(),
            bucket = %config.coarse_bucket,
            "too few coarse buckets; the coarse veto never fires"
        );
    }

    let summary = output.summary();
    tracing::info!(
        symbol = %loaded.symbol,
        bars = summary.bars,
        buy = summary.buy,
        sell = summary.sell,
        neutral = summary.neutral,
        "signals computed"
    );

    Ok(SignalRun { loaded, output })
}

impl SignalRun {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            schema_version: SCHEMA_VERSION,
            symbol: self.loaded.symbol.clone(),
            interval: self.loaded.interval,
            source: self.loaded.source,
            first_timestamp: self.output.series.first().map(|c| c.timestamp),
            last_timestamp: self.output.series.last().map(|c| c.timestamp),
            config: self.output.config.clone(),
            fingerprint: self.output.fingerprint.clone(),
            signals: self.output.summary(),
            data_quality_warnings: self.loaded.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticProvider;
    use hybridlab_core::Signal;

    #[test]
    fn synthetic_run_end_to_end() {
        let config = PipelineConfig {
            history_limit: 400,
            ..Default::default()
        };
        let run = run_signals(&SyntheticProvider::default(), "BTCUSDT", Interval::OneDay, &config).unwrap();
        assert_eq!(run.output.len(), 400);

        let summary = run.summary();
        assert_eq!(summary.schema_version, SCHEMA_VERSION);
        assert_eq!(summary.source, DataSource::Synthetic);
        assert_eq!(summary.signals.bars, 400);
        assert_eq!(summary.fingerprint.dataset_hash, run.loaded.dataset_hash);
        assert!(summary.first_timestamp < summary.last_timestamp);
    }

    #[test]
    fn invalid_config_fails_before_loading() {
        let config = PipelineConfig {
            macd_fast: 30,
            ..Default::default()
        };
        let err = run_signals(&SyntheticProvider::default(), "BTCUSDT", Interval::OneDay, &config).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::MacdSpans { .. })));
    }

    #[test]
    fn short_history_is_degenerate_not_fatal() {
        let config = PipelineConfig {
            history_limit: 20,
            ..Default::default()
        };
        let run = run_signals(&SyntheticProvider::default(), "BTCUSDT", Interval::OneHour, &config).unwrap();
        assert_eq!(run.output.hybrid.count(Signal::Neutral), 20);
    }

    #[test]
    fn rerun_is_idempotent() {
        let config = PipelineConfig::default();
        let provider = SyntheticProvider::default();
        let a = run_signals(&provider, "ETHUSDT", Interval::FourHours, &config).unwrap();
        let b = run_signals(&provider, "ETHUSDT", Interval::FourHours, &config).unwrap();
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.output.hybrid, b.output.hybrid);
    }
}
