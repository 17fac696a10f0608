use crate::errors::CalcError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;

/// A single timestamped sensor value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// All readings returned by a provider for one sensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSeries {
    pub sensor: String,
    pub readings: Vec<Reading>,
}

impl SensorSeries {
    pub fn new(sensor: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            sensor: sensor.into(),
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Closed UTC interval `[start, end]`.
///
/// Dates given without a time of day resolve to midnight UTC, so a window built
/// from `"2016-6-1"` and `"2016-6-30"` ends at `2016-06-30T00:00:00Z` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Builds a window from two date strings such as `"2016-1-1"`.
    pub fn from_dates(start_date: &str, end_date: &str) -> Result<Self, CalcError> {
        Ok(Self {
            start: parse_window_date("start_date", start_date)?,
            end: parse_window_date("end_date", end_date)?,
        })
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }
}

/// Parse a window boundary as a UTC instant.
///
/// Accepts `YYYY-M-D` (zero padding optional) or a full RFC 3339 timestamp.
pub fn parse_window_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, CalcError> {
    let trimmed = value.trim();
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))),
        Err(date_err) => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| CalcError::InvalidDate {
                field,
                value: value.to_string(),
                source: date_err,
            }),
    }
}

/// Weekday business hours `[start_hour, end_hour)`, Monday to Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancySpec {
    start_hour: u32,
    end_hour: u32,
}

impl OccupancySpec {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, CalcError> {
        if start_hour >= end_hour {
            return Err(CalcError::InvalidHours {
                start_hour,
                end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// `weekday` counts from Monday = 0.
    pub fn is_occupied(&self, hour: u32, weekday: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour && weekday <= 4
    }
}

/// Inclusive comfort bounds per season. Ordering of low/high is not checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSpec {
    pub summer_low: f64,
    pub summer_high: f64,
    pub winter_low: f64,
    pub winter_high: f64,
}

impl ThresholdSpec {
    pub fn bounds(&self, season: Season) -> (f64, f64) {
        match season {
            Season::Summer => (self.summer_low, self.summer_high),
            Season::Winter => (self.winter_low, self.winter_high),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    /// June-August is summer, December-February is winter, the rest is unclassified.
    /// Winter does not look at the year: readings from different winters pool together.
    pub fn of_month(month: u32) -> Option<Self> {
        match month {
            6..=8 => Some(Season::Summer),
            12 | 1 | 2 => Some(Season::Winter),
            _ => None,
        }
    }
}

/// A reading with its UTC calendar labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledReading {
    pub reading: Reading,
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6
    pub weekday: u32,
    pub month: u32,
}

impl From<Reading> for LabeledReading {
    fn from(reading: Reading) -> Self {
        let ts = reading.timestamp;
        Self {
            reading,
            hour: ts.hour(),
            weekday: ts.weekday().num_days_from_monday(),
            month: ts.month(),
        }
    }
}

impl LabeledReading {
    pub fn value(&self) -> f64 {
        self.reading.value
    }

    pub fn season(&self) -> Option<Season> {
        Season::of_month(self.month)
    }
}

/// Per-season counts behind an outlier ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OutlierSummary {
    pub summer_total: usize,
    pub summer_out: usize,
    pub winter_total: usize,
    pub winter_out: usize,
    pub ratio: f64,
}

impl OutlierSummary {
    pub fn occupied_total(&self) -> usize {
        self.summer_total + self.winter_total
    }

    pub fn outside_total(&self) -> usize {
        self.summer_out + self.winter_out
    }
}
