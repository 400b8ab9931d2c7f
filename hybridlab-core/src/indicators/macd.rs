//! Moving Average Convergence/Divergence (MACD).
//!
//! Three lines (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, sign)
//! - Histogram: line - signal
//!
//! Each EMA is seeded by its first defined input and suppressed until it has
//! seen `span` observations, so the line is first defined at index `slow - 1`
//! and the signal at index `slow + sign - 2`.

use super::ema::ema;
use super::Indicator;

/// Which MACD output to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD outputs, each the same length as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute all three MACD lines in one go.
pub fn macd_lines(closes: &[f64], fast: usize, slow: usize, sign: usize) -> MacdOutput {
    let ema_fast = ema(closes, fast, fast);
    let ema_slow = ema(closes, slow, slow);

    // NaN - x is NaN, so the line is undefined wherever either EMA is.
    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&macd, sign, sign);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdOutput {
        macd,
        signal,
        histogram,
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    sign: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    fn build(fast: usize, slow: usize, sign: usize, line: MacdLine, prefix: &str) -> Self {
        assert!(fast >= 1 && slow >= 1 && sign >= 1, "MACD spans must be >= 1");
        Self {
            fast,
            slow,
            sign,
            line,
            name: format!("{prefix}_{fast}_{slow}_{sign}"),
        }
    }

    pub fn line(fast: usize, slow: usize, sign: usize) -> Self {
        Self::build(fast, slow, sign, MacdLine::Line, "macd")
    }

    pub fn signal(fast: usize, slow: usize, sign: usize) -> Self {
        Self::build(fast, slow, sign, MacdLine::Signal, "macd_signal")
    }

    pub fn histogram(fast: usize, slow: usize, sign: usize) -> Self {
        Self::build(fast, slow, sign, MacdLine::Histogram, "macd_histogram")
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow) - 1;
        match self.line {
            MacdLine::Line => line,
            MacdLine::Signal | MacdLine::Histogram => line + self.sign - 1,
        }
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let out = macd_lines(closes, self.fast, self.slow, self.sign);
        match self.line {
            MacdLine::Line => out.macd,
            MacdLine::Signal => out.signal,
            MacdLine::Histogram => out.histogram,
        }
    }
}
