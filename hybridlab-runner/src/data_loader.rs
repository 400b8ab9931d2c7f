//! Series loading and config resolution for the runner.
//!
//! Fetches candles through a provider, validates them into an `OhlcvSeries`,
//! and records provenance (source, dataset hash, data-quality warnings).
//! Ordering and duplicate checks are not repaired here: a provider that
//! returns unordered candles is a contract violation and fails the load.

use std::path::{Path, PathBuf};

use hybridlab_core::fingerprint::dataset_hash;
use hybridlab_core::{ConfigError, OhlcvSeries, PipelineConfig, SeriesError};
use thiserror::Error;

use crate::data::{DataError, DataProvider, DataSource, Interval};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("invalid series from provider: {0}")]
    Series(#[from] SeriesError),

    #[error("provider '{provider}' returned no candles for '{symbol}'")]
    Empty { provider: String, symbol: String },

    #[error("provider '{provider}' is unavailable (rate limited or blocked)")]
    Unavailable { provider: String },

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config { path: PathBuf, source: ConfigError },
}

/// A validated series plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub symbol: String,
    pub interval: Interval,
    pub source: DataSource,
    pub series: OhlcvSeries,
    /// BLAKE3 over all candle data.
    pub dataset_hash: String,
    /// Non-fatal issues, e.g. candles whose high/low do not bracket open/close.
    pub warnings: Vec<String>,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Fetch and validate the newest `limit` candles.
pub fn load_series(
    provider: &dyn DataProvider,
    symbol: &str,
    interval: Interval,
    limit: usize,
) -> Result<LoadedSeries, LoadError> {
    if !provider.is_available() {
        return Err(LoadError::Unavailable {
            provider: provider.name().to_string(),
        });
    }

    let fetched = provider.fetch(symbol, interval, limit)?;
    if fetched.candles.is_empty() {
        return Err(LoadError::Empty {
            provider: provider.name().to_string(),
            symbol: symbol.to_string(),
        });
    }

    let insane = fetched.candles.iter().filter(|c| !c.is_sane()).count();
    let series = OhlcvSeries::new(fetched.candles)?;

    let mut warnings = Vec::new();
    if insane > 0 {
        let msg = format!("{insane} candle(s) with high/low not bracketing open/close");
        tracing::warn!(symbol, "{msg}");
        warnings.push(msg);
    }

    tracing::info!(
        symbol,
        %interval,
        source = fetched.source.as_str(),
        candles = series.len(),
        "series loaded"
    );

    Ok(LoadedSeries {
        symbol: fetched.symbol,
        interval,
        source: fetched.source,
        dataset_hash: dataset_hash(&series),
        series,
        warnings,
    })
}

/// Read, parse, and validate a TOML pipeline config.
pub fn load_config(path: &Path) -> Result<PipelineConfig, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    let config = PipelineConfig::from_toml(&content)
        .and_then(|c| c.validate().map(|()| c))
        .map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config)
}
