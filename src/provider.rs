use crate::config::ProviderConfig;
use crate::errors::FetchError;
use crate::models::{Reading, SensorSeries};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Source of raw readings for a sensor, addressed by an opaque metadata URI.
#[allow(async_fn_in_trait)]
pub trait ReadingProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError>;
}

// One stream of an sMAP-style archive: `[{"uuid": ..., "Readings": [[ms, value], ...]}]`
#[derive(Deserialize, Debug)]
struct StreamData {
    uuid: String,
    #[serde(rename = "Readings", default)]
    readings: Vec<(f64, Option<f64>)>,
}

/// Decode a stream list and pick the stream for `uri`.
///
/// A payload holding a single stream is used even when its uuid differs.
/// Null values decode as NaN.
pub fn decode_streams(uri: &str, body: &[u8]) -> Result<SensorSeries, FetchError> {
    let streams: Vec<StreamData> =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;

    let stream_count = streams.len();
    let stream = match streams.iter().position(|s| s.uuid == uri) {
        Some(idx) => streams.into_iter().nth(idx),
        None if stream_count == 1 => {
            let only = streams.into_iter().next();
            if let Some(s) = &only {
                warn!("No stream keyed '{}', using the only stream '{}'", uri, s.uuid);
            }
            only
        }
        None => None,
    }
    .ok_or_else(|| FetchError::UnknownSensor {
        uri: uri.to_string(),
    })?;

    let mut readings = Vec::with_capacity(stream.readings.len());
    for (ts_ms, value) in stream.readings {
        let timestamp = Utc
            .timestamp_millis_opt(ts_ms as i64)
            .single()
            .ok_or_else(|| FetchError::Malformed {
                uri: uri.to_string(),
                message: format!("timestamp {} ms is out of range", ts_ms),
            })?;
        readings.push(Reading::new(timestamp, value.unwrap_or(f64::NAN)));
    }

    debug!(
        "Decoded {} readings for '{}' from {} stream(s)",
        readings.len(),
        uri,
        stream_count
    );
    Ok(SensorSeries::new(uri, readings))
}

/// Fetches readings from a remote data service over HTTP.
pub struct HttpReadingProvider {
    base_url: String,
    auth_token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpReadingProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        // No client-level timeout: the caller bounds the whole fetch
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            http_client,
        })
    }

    fn readings_url(&self) -> String {
        format!("{}/readings", self.base_url)
    }
}

impl ReadingProvider for HttpReadingProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError> {
        let url = self.readings_url();
        info!("Fetching readings for '{}' from {}", uri, url);

        let mut request = self.http_client.get(&url).query(&[("uri", uri)]);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let http_err = |source: reqwest::Error| FetchError::Http {
            uri: uri.to_string(),
            source,
        };
        let response = request.send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: uri.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(http_err)?;
        decode_streams(uri, &body)
    }
}

/// Reads an archived stream list from disk.
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReadingProvider for JsonFileProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError> {
        info!("Loading readings for '{}' from {}", uri, self.path.display());
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FetchError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        decode_streams(uri, &body)
    }
}

/// Readings held in memory, keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    streams: HashMap<String, Vec<Reading>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(mut self, uri: impl Into<String>, readings: Vec<Reading>) -> Self {
        self.streams.insert(uri.into(), readings);
        self
    }
}

impl ReadingProvider for InMemoryProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError> {
        self.streams
            .get(uri)
            .map(|readings| SensorSeries::new(uri, readings.clone()))
            .ok_or_else(|| FetchError::UnknownSensor {
                uri: uri.to_string(),
            })
    }
}
