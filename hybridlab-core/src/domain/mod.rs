//! Domain types for HybridLab

pub mod candle;
pub mod series;
pub mod signal;

pub use candle::Candle;
pub use series::{OhlcvSeries, SeriesError};
pub use signal::{HybridSignalSeries, Signal, SignalSeries};
