//! Signal classifier: per-bar RSI + MACD threshold rules.
//!
//! BUY if `rsi < buy_rsi` and `macd > macd_signal`.
//! SELL if `rsi > sell_rsi` and `macd < macd_signal`.
//! Otherwise, or if any input is undefined, NONE.
//!
//! The BUY rule is evaluated first, so a bar can never carry both labels even
//! when the thresholds overlap. Rows are independent; the frame is classified
//! in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Signal, SignalSeries};
use crate::frame::{IndicatorFrame, IndicatorRow};

/// RSI thresholds for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub buy_rsi: f64,
    pub sell_rsi: f64,
}

impl Thresholds {
    pub fn new(buy_rsi: f64, sell_rsi: f64) -> Self {
        Self { buy_rsi, sell_rsi }
    }
}

/// Classify a single bar from its raw indicator values.
pub fn classify_values(
    rsi: Option<f64>,
    macd: Option<f64>,
    macd_signal: Option<f64>,
    thresholds: &Thresholds,
) -> Signal {
    let (Some(rsi), Some(macd), Some(macd_signal)) = (rsi, macd, macd_signal) else {
        return Signal::Neutral;
    };

    if rsi < thresholds.buy_rsi && macd > macd_signal {
        Signal::Buy
    } else if rsi > thresholds.sell_rsi && macd < macd_signal {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

pub fn classify_row(row: &IndicatorRow, thresholds: &Thresholds) -> Signal {
    classify_values(row.rsi, row.macd, row.macd_signal, thresholds)
}

/// Classify every bar of a frame. Output is 1:1 with the frame's index.
pub fn classify(frame: &IndicatorFrame, thresholds: &Thresholds) -> SignalSeries {
    let signals: Vec<Signal> = (0..frame.len())
        .into_par_iter()
        .map(|i| {
            frame
                .row(i)
                .map_or(Signal::Neutral, |row| classify_row(&row, thresholds))
        })
        .collect();

    SignalSeries::from_parts(frame.timestamps(), signals)
}
