use crate::errors::CalcError;
use crate::models::{OccupancySpec, OutlierSummary, QueryWindow, ThresholdSpec};
use crate::pipeline::OccupancyOutlierCalculator;
use crate::provider::ReadingProvider;
use std::time::Duration;
use tracing::info;

/// String-level parameters for one outlier computation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierRequest {
    pub sensor_uri: String,
    /// `YYYY-M-D`
    pub start_date: String,
    /// `YYYY-M-D`
    pub end_date: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub summer_low: f64,
    pub summer_high: f64,
    pub winter_low: f64,
    pub winter_high: f64,
}

impl OutlierRequest {
    pub fn thresholds(&self) -> ThresholdSpec {
        ThresholdSpec {
            summer_low: self.summer_low,
            summer_high: self.summer_high,
            winter_low: self.winter_low,
            winter_high: self.winter_high,
        }
    }

    /// Validate the hour range and parse the dates.
    pub fn calculator(&self) -> Result<OccupancyOutlierCalculator, CalcError> {
        let occupancy = OccupancySpec::new(self.start_hour, self.end_hour)?;
        let window = QueryWindow::from_dates(&self.start_date, &self.end_date)?;
        Ok(OccupancyOutlierCalculator::new(
            window,
            occupancy,
            self.thresholds(),
        ))
    }
}

/// Fetch the sensor's readings and summarise its occupied-hours outliers.
///
/// Inputs are validated before the provider is contacted. The fetch is the only
/// await point and is bounded by `fetch_timeout`.
pub async fn summarize_for_sensor<P: ReadingProvider>(
    provider: &P,
    request: &OutlierRequest,
    fetch_timeout: Duration,
) -> Result<OutlierSummary, CalcError> {
    let calculator = request.calculator()?;

    let series = tokio::time::timeout(fetch_timeout, provider.fetch(&request.sensor_uri))
        .await
        .map_err(|_| CalcError::FetchTimeout {
            uri: request.sensor_uri.clone(),
            timeout: fetch_timeout,
        })??;
    info!(
        "Fetched {} readings for '{}'",
        series.len(),
        request.sensor_uri
    );

    let summary = calculator.summarize(&series.readings);
    info!(
        "{} of {} occupied seasonal readings outside range (ratio {:.2})",
        summary.outside_total(),
        summary.occupied_total(),
        summary.ratio
    );
    Ok(summary)
}

pub async fn compute_for_sensor<P: ReadingProvider>(
    provider: &P,
    request: &OutlierRequest,
    fetch_timeout: Duration,
) -> Result<f64, CalcError> {
    Ok(summarize_for_sensor(provider, request, fetch_timeout)
        .await?
        .ratio)
}
