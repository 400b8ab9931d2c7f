//! Candle acquisition: providers and their error types.

pub mod binance;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceProvider;
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, Interval};
pub use synthetic::SyntheticProvider;
