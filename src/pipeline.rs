//! Occupied-hours outlier ratio.
//!
//! Each stage is a plain function over a reading list so it can be tested on its
//! own. [`OccupancyOutlierCalculator`] chains them in order:
//! window -> labels -> occupancy -> seasons -> bounds -> ratio.

use crate::models::{
    LabeledReading, OccupancySpec, OutlierSummary, QueryWindow, Reading, Season, SensorSeries,
    ThresholdSpec,
};
use tracing::debug;

/// Keep readings whose timestamp lies in the closed window.
pub fn filter_window(readings: &[Reading], window: &QueryWindow) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| window.contains(&r.timestamp))
        .copied()
        .collect()
}

pub fn label(readings: Vec<Reading>) -> Vec<LabeledReading> {
    readings.into_iter().map(LabeledReading::from).collect()
}

/// Weekday readings inside the occupied hour range.
pub fn occupied(labeled: Vec<LabeledReading>, occupancy: &OccupancySpec) -> Vec<LabeledReading> {
    labeled
        .into_iter()
        .filter(|r| occupancy.is_occupied(r.hour, r.weekday))
        .collect()
}

/// Split into (summer, winter). Readings in spring or autumn are dropped.
pub fn split_seasons(
    labeled: Vec<LabeledReading>,
) -> (Vec<LabeledReading>, Vec<LabeledReading>) {
    let mut summer = Vec::new();
    let mut winter = Vec::new();
    for reading in labeled {
        match reading.season() {
            Some(Season::Summer) => summer.push(reading),
            Some(Season::Winter) => winter.push(reading),
            None => {}
        }
    }
    (summer, winter)
}

/// Strictly below `low` or strictly above `high`. NaN is never outside.
pub fn is_outside(value: f64, low: f64, high: f64) -> bool {
    value < low || value > high
}

pub fn count_outside(readings: &[LabeledReading], low: f64, high: f64) -> usize {
    readings
        .iter()
        .filter(|r| is_outside(r.value(), low, high))
        .count()
}

/// `outside / total`, or 0.0 when nothing was counted.
pub fn outside_ratio(outside: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    outside as f64 / total as f64
}

/// Two decimals, correctly rounded from the exact binary value (ties to even).
pub fn round_to_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[derive(Debug, Clone, Copy)]
pub struct OccupancyOutlierCalculator {
    window: QueryWindow,
    occupancy: OccupancySpec,
    thresholds: ThresholdSpec,
}

impl OccupancyOutlierCalculator {
    pub fn new(window: QueryWindow, occupancy: OccupancySpec, thresholds: ThresholdSpec) -> Self {
        Self {
            window,
            occupancy,
            thresholds,
        }
    }

    pub fn summarize(&self, readings: &[Reading]) -> OutlierSummary {
        let in_window = filter_window(readings, &self.window);
        debug!(
            "{} of {} readings inside window {} .. {}",
            in_window.len(),
            readings.len(),
            self.window.start,
            self.window.end
        );

        let occupied = occupied(label(in_window), &self.occupancy);
        debug!(
            "{} readings in occupied hours [{}, {})",
            occupied.len(),
            self.occupancy.start_hour(),
            self.occupancy.end_hour()
        );

        let (summer, winter) = split_seasons(occupied);
        let (summer_low, summer_high) = self.thresholds.bounds(Season::Summer);
        let (winter_low, winter_high) = self.thresholds.bounds(Season::Winter);

        let summer_out = count_outside(&summer, summer_low, summer_high);
        let winter_out = count_outside(&winter, winter_low, winter_high);
        debug!(
            "summer: {}/{} outside [{}, {}], winter: {}/{} outside [{}, {}]",
            summer_out,
            summer.len(),
            summer_low,
            summer_high,
            winter_out,
            winter.len(),
            winter_low,
            winter_high
        );

        let total = summer.len() + winter.len();
        OutlierSummary {
            summer_total: summer.len(),
            summer_out,
            winter_total: winter.len(),
            winter_out,
            ratio: round_to_hundredths(outside_ratio(summer_out + winter_out, total)),
        }
    }

    pub fn compute(&self, readings: &[Reading]) -> f64 {
        self.summarize(readings).ratio
    }
}

/// Fraction of occupied seasonal readings outside their season's bounds.
pub fn compute(
    series: &SensorSeries,
    window: &QueryWindow,
    occupancy: &OccupancySpec,
    thresholds: &ThresholdSpec,
) -> f64 {
    OccupancyOutlierCalculator::new(*window, *occupancy, *thresholds).compute(&series.readings)
}
