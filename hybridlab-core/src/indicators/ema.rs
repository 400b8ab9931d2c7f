//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = k * x[t] + (1 - k) * EMA[t-1], k = 2 / (span + 1).
//! Seed: EMA = first defined value (leading NaNs are skipped).
//! Values are suppressed (NaN) until `min_periods` observations have been seen.

use super::Indicator;

/// EMA of an arbitrary series.
///
/// Once the recurrence has started, a NaN input taints every later value.
pub fn ema(values: &[f64], span: usize, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if span == 0 {
        return result;
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut seen = 0usize;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            if prev.is_some() {
                return result;
            }
            continue;
        }
        let current = match prev {
            None => v,
            Some(p) => k * v + (1.0 - k) * p,
        };
        prev = Some(current);
        seen += 1;
        if seen >= min_periods {
            result[i] = current;
        }
    }

    result
}

/// EMA of close prices with warmup suppressed for the first `span - 1` values.
#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.span - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        ema(closes, self.span, self.span)
    }
}
