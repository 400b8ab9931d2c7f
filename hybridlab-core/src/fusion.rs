//! Hybrid fusion: combine the fine signal with the aligned coarse signal.
//!
//! Precedence, per bar:
//! 1. coarse SELL → SELL (veto, regardless of the fine signal)
//! 2. fine BUY → BUY
//! 3. otherwise NONE
//!
//! The rule is asymmetric: a coarse BUY only means "no veto", and a fine
//! SELL on its own never produces a hybrid SELL.

use thiserror::Error;

use crate::domain::{HybridSignalSeries, Signal, SignalSeries};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FusionError {
    #[error("index length mismatch: fine has {fine} bars, aligned coarse has {coarse}")]
    LengthMismatch { fine: usize, coarse: usize },

    #[error("index mismatch at bar {index}: aligned coarse series is not on the fine index")]
    IndexMismatch { index: usize },
}

/// Fuse one bar.
pub fn fuse_one(fine: Signal, coarse_aligned: Signal) -> Signal {
    if coarse_aligned == Signal::Sell {
        Signal::Sell
    } else if fine == Signal::Buy {
        Signal::Buy
    } else {
        Signal::Neutral
    }
}

/// Fuse two series that share the same index.
pub fn fuse(
    fine: &SignalSeries,
    coarse_aligned: &SignalSeries,
) -> Result<HybridSignalSeries, FusionError> {
    if fine.len() != coarse_aligned.len() {
        return Err(FusionError::LengthMismatch {
            fine: fine.len(),
            coarse: coarse_aligned.len(),
        });
    }
    if let Some(index) = fine
        .timestamps()
        .iter()
        .zip(coarse_aligned.timestamps())
        .position(|(a, b)| a != b)
    {
        return Err(FusionError::IndexMismatch { index });
    }

    let signals = fine
        .signals()
        .iter()
        .zip(coarse_aligned.signals())
        .map(|(&f, &c)| fuse_one(f, c))
        .collect();

    Ok(SignalSeries::from_parts(fine.timestamps().to_vec(), signals))
}
