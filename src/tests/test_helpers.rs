use crate::models::{OccupancySpec, QueryWindow, Reading, ThresholdSpec};
use chrono::{TimeZone, Utc};

pub const SENSOR: &str = "http://buildsys.org/ontologies/Brick#Zone_Air_Temperature_Sensor_1";

pub fn reading(y: i32, m: u32, d: u32, h: u32, value: f64) -> Reading {
    Reading::new(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(), value)
}

pub fn office_hours() -> OccupancySpec {
    OccupancySpec::new(9, 17).unwrap()
}

/// Summer [70, 80] F, winter [65, 75] F.
pub fn comfort_bounds() -> ThresholdSpec {
    ThresholdSpec {
        summer_low: 70.0,
        summer_high: 80.0,
        winter_low: 65.0,
        winter_high: 75.0,
    }
}

pub fn june_2016() -> QueryWindow {
    QueryWindow::from_dates("2016-6-1", "2016-6-30").unwrap()
}
