//! Indicator engine.
//!
//! Indicators are pure functions: close prices in, numeric series out, same
//! length as the input. Undefined values (warmup, poisoned input) are
//! `f64::NAN`, never zero.
//!
//! Multi-series indicators (MACD) are exposed as separate named instances per
//! output line, keeping the single-series `Indicator` trait unchanged.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::{ema, Ema};
pub use macd::{macd_lines, Macd, MacdLine, MacdOutput};
pub use rsi::Rsi;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at index t may depend on a price at index t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "macd_signal_12_26_9").
    fn name(&self) -> &str;

    /// Number of leading values that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire close-price sequence.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
