//! HybridLab Runner: candle acquisition, signal runs, and export.
//!
//! This crate builds on `hybridlab-core` to provide:
//! - Data providers (Binance REST, CSV import, synthetic random walk)
//! - Series loading with validation and provenance
//! - Run orchestration and persisted run summaries
//! - CSV and JSON export

pub mod data;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use data::{
    BinanceProvider, CircuitBreaker, CsvProvider, DataError, DataProvider, DataSource,
    FetchResult, Interval, SyntheticProvider,
};
pub use data_loader::{load_config, load_series, LoadError, LoadedSeries};
pub use export::{export_signals_csv, export_summary_json, import_summary_json, write_candles_csv};
pub use runner::{run_loaded, run_signals, RunError, RunSummary, SignalRun, SCHEMA_VERSION};
