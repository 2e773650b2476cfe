//! Core library for the `tempwatch` CLI.
//!
//! This crate defines:
//! - Synthetic dataset generation and CSV persistence
//! - Per-city rolling statistics, anomaly detection and seasonal baselines
//! - Sequential and parallel batch analysis across cities
//! - Blocking and concurrent current-weather lookups against OpenWeather
//! - Configuration & credentials handling
//!
//! It is used by `tempwatch-cli`, but can also be reused by other binaries or services.

pub mod analysis;
pub mod baseline;
pub mod batch;
pub mod bench;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod model;
pub mod provider;
pub mod season;
pub mod stats;

pub use analysis::{AnalysisParams, analyze_city, analyze_city_with};
pub use baseline::{BaselineComparison, BaselineVerdict, compare_to_baseline, current_season};
pub use batch::{
    BatchResults, run_analysis_parallel, run_analysis_parallel_with, run_analysis_sequential,
};
pub use config::Config;
pub use error::{AnalysisError, BatchError, GenerateError};
pub use generator::{ensure_data_at, ensure_data_exists, generate_dataset};
pub use model::{
    AnalyzedRow, AnalyzedSeries, CityAnalysis, Dataset, ObservationStatus, Reading, SeasonalStat,
    WeatherDocument,
};
pub use provider::{
    WeatherFetcher, fetch_blocking, fetch_concurrent, fetch_serial, fetch_serial_with,
    get_weather_batch, get_weather_batch_with, get_weather_sync, openweather::OpenWeatherClient,
};
pub use season::Season;
