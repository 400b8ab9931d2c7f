//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple average of the first `window` deltas, first value at index `window`.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0;
//! both zero (flat price) → RSI = 50.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
    name: String,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RSI window must be >= 1");
        Self {
            window,
            name: format!("rsi_{window}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.window + 1 {
            return result;
        }

        let alpha = 1.0 / self.window as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for i in 1..n {
            let change = closes[i] - closes[i - 1];
            if change.is_nan() {
                // NaN in the seed window or after it: everything from here is undefined
                return result;
            }
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if i < self.window {
                avg_gain += gain;
                avg_loss += loss;
                continue;
            }

            if i == self.window {
                avg_gain = (avg_gain + gain) / self.window as f64;
                avg_loss = (avg_loss + loss) / self.window as f64;
            } else {
                avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
                avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            }

            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_price_is_fifty() {
        let result = Rsi::new(14).compute(&[250.0; 40]);
        assert!(result[13].is_nan());
        for v in &result[14..] {
            assert_approx(*v, 50.0, 1e-12);
        }
    }

    #[test]
    fn rsi_mixed_known_values() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33
        // Changes: +0.34, -0.25, -0.48, +0.72
        // window=3 seed: avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI[3] = 100 - 100/(1 + 0.34/0.73) = 31.7757...
        // Wilder step: avg_gain = (0.72 + 2*0.34/3)/3, avg_loss = (2*0.73/3)/3
        let result = Rsi::new(3).compute(&[44.0, 44.34, 44.09, 43.61, 44.33]);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);

        let g = (0.72 + 2.0 * 0.34 / 3.0) / 3.0;
        let l = (2.0 * 0.73 / 3.0) / 3.0;
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + g / l), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        let result = Rsi::new(3).compute(&closes);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_too_short_is_all_undefined() {
        let result = Rsi::new(14).compute(&[1.0, 2.0, 3.0]);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|v| v.is_nan()));
        assert!(Rsi::new(14).compute(&[]).is_empty());
    }

    #[test]
    fn rsi_nan_propagation() {
        let result = Rsi::new(3).compute(&[100.0, 101.0, f64::NAN, 103.0, 104.0]);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
