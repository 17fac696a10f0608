pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod service;

pub use errors::{CalcError, ConfigError, FetchError};
pub use models::{OccupancySpec, OutlierSummary, QueryWindow, Reading, SensorSeries, ThresholdSpec};
pub use pipeline::{compute, OccupancyOutlierCalculator};
pub use service::{compute_for_sensor, summarize_for_sensor, OutlierRequest};

#[cfg(test)]
mod tests;
