use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Config {path} is not valid JSON: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No config file at {path}")]
    NotFound { path: PathBuf },
    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

/// Failures reaching or decoding the reading provider.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("HTTP request for sensor '{uri}' failed: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Provider answered {status} for sensor '{uri}'")]
    Status {
        uri: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error reading readings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed provider response for sensor '{uri}': {message}")]
    Malformed { uri: String, message: String },
    #[error("No reading stream found for sensor '{uri}'")]
    UnknownSensor { uri: String },
}

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Invalid {field} '{value}': {source}")]
    InvalidDate {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Start hour {start_hour} must be before end hour {end_hour}")]
    InvalidHours { start_hour: u32, end_hour: u32 },
    #[error("Reading fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Reading fetch for sensor '{uri}' timed out after {timeout:?}")]
    FetchTimeout { uri: String, timeout: Duration },
}
