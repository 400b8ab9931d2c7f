//! Pipeline configuration.
//!
//! Loaded from TOML; every field has a default so partial files are valid.
//! `validate()` runs before any computation and rejects bad windows and
//! thresholds up front.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::Thresholds;
use crate::frame::IndicatorParams;
use crate::resample::Bucket;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be >= 1")]
    ZeroWindow { field: &'static str },

    #[error("macd_fast ({fast}) must be smaller than macd_slow ({slow})")]
    MacdSpans { fast: usize, slow: usize },

    #[error("{field} = {value} is outside [0, 100]")]
    ThresholdOutOfRange { field: &'static str, value: f64 },

    #[error("{timeframe} buy threshold ({buy}) must be below the sell threshold ({sell})")]
    InvertedThresholds {
        timeframe: &'static str,
        buy: f64,
        sell: f64,
    },

    #[error("history_limit must be >= 1")]
    ZeroHistoryLimit,

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// All recognized pipeline options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub daily_buy_rsi_threshold: f64,
    pub daily_sell_rsi_threshold: f64,
    pub weekly_buy_rsi_threshold: f64,
    pub weekly_sell_rsi_threshold: f64,
    pub coarse_bucket: Bucket,
    /// Only the newest `history_limit` candles of the input are used.
    pub history_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            daily_buy_rsi_threshold: 50.0,
            daily_sell_rsi_threshold: 65.0,
            weekly_buy_rsi_threshold: 50.0,
            weekly_sell_rsi_threshold: 55.0,
            coarse_bucket: Bucket::Week,
            history_limit: 2000,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from a TOML string. Does not validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("rsi_window", self.rsi_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroWindow { field });
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdSpans {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }

        for (field, value) in [
            ("daily_buy_rsi_threshold", self.daily_buy_rsi_threshold),
            ("daily_sell_rsi_threshold", self.daily_sell_rsi_threshold),
            ("weekly_buy_rsi_threshold", self.weekly_buy_rsi_threshold),
            ("weekly_sell_rsi_threshold", self.weekly_sell_rsi_threshold),
        ] {
            // NaN fails `contains`
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }
        for (timeframe, t) in [
            ("daily", self.daily_thresholds()),
            ("weekly", self.weekly_thresholds()),
        ] {
            if t.buy_rsi >= t.sell_rsi {
                return Err(ConfigError::InvertedThresholds {
                    timeframe,
                    buy: t.buy_rsi,
                    sell: t.sell_rsi,
                });
            }
        }

        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_window: self.rsi_window,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    pub fn daily_thresholds(&self) -> Thresholds {
        Thresholds::new(self.daily_buy_rsi_threshold, self.daily_sell_rsi_threshold)
    }

    pub fn weekly_thresholds(&self) -> Thresholds {
        Thresholds::new(self.weekly_buy_rsi_threshold, self.weekly_sell_rsi_threshold)
    }
}
