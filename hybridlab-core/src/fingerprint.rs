//! Run fingerprinting: deterministic identification of pipeline inputs and outputs.
//!
//! - `config_hash`: BLAKE3 over the canonical JSON of a `PipelineConfig`.
//! - `dataset_hash`: BLAKE3 over every candle's timestamp and OHLCV bytes.
//! - `signals_hash`: BLAKE3 over a signal series (timestamps + labels).
//!
//! Two runs on identical input and configuration must produce identical
//! fingerprints, including the output hash.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::domain::{OhlcvSeries, SignalSeries};

/// Complete fingerprint of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: String,
    pub dataset_hash: String,
    pub output_hash: String,
}

pub fn config_hash(config: &PipelineConfig) -> String {
    // Struct fields serialize in declaration order, so the JSON is canonical.
    let json = serde_json::to_string(config).expect("PipelineConfig must serialize");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

pub fn dataset_hash(series: &OhlcvSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in series.candles() {
        hasher.update(&c.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

pub fn signals_hash(signals: &SignalSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for (t, s) in signals.iter() {
        hasher.update(&t.timestamp_millis().to_le_bytes());
        hasher.update(s.as_str().as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
