//! Categorical signals and per-timestamp signal series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-bar trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[default]
    #[serde(rename = "NONE")]
    Neutral,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Neutral => "NONE",
        }
    }

    pub fn is_actionable(self) -> bool {
        self != Signal::Neutral
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signal per timestamp, in timestamp order.
///
/// Produced by the classifier (1:1 with an indicator frame), the aligner
/// (1:1 with the fine index), and fusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalSeries {
    timestamps: Vec<DateTime<Utc>>,
    signals: Vec<Signal>,
}

/// Terminal artifact of a pipeline run: one fused signal per fine bar.
pub type HybridSignalSeries = SignalSeries;

impl SignalSeries {
    /// Pair timestamps with signals. Both vectors must have equal length.
    pub(crate) fn from_parts(timestamps: Vec<DateTime<Utc>>, signals: Vec<Signal>) -> Self {
        debug_assert_eq!(timestamps.len(), signals.len());
        Self {
            timestamps,
            signals,
        }
    }

    /// Build from `(timestamp, signal)` pairs. Returns `None` if the
    /// timestamps are not strictly increasing.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (DateTime<Utc>, Signal)>) -> Option<Self> {
        let (timestamps, signals): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        Some(Self {
            timestamps,
            signals,
        })
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Signal> {
        self.signals.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, Signal)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.signals.iter().copied())
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.signals.iter().filter(|&&s| s == signal).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn signal_renders_as_labels() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Neutral.to_string(), "NONE");
        assert_eq!(serde_json::to_string(&Signal::Neutral).unwrap(), "\"NONE\"");
    }

    #[test]
    fn from_pairs_rejects_unordered() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ok = SignalSeries::from_pairs([(t0, Signal::Buy), (t0 + Duration::days(1), Signal::Sell)]);
        assert_eq!(ok.unwrap().count(Signal::Buy), 1);

        let bad = SignalSeries::from_pairs([(t0, Signal::Buy), (t0, Signal::Sell)]);
        assert!(bad.is_none());
    }
}
