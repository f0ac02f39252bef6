//! Shared test fixtures for integration tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use powerdash::config::DashboardConfig;
use powerdash::feed::TelemetrySample;
use powerdash::forecast::ForecastEngine;

/// A Tuesday, so weekday charging-cutoff rules apply.
pub fn weekday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, 4).unwrap()
}

/// The Sunday before [`weekday`].
pub fn weekend() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 7, 2).unwrap()
}

pub fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_hms_opt(h, m, 0).unwrap()
}

/// Default engine built from the site hardware configuration.
pub fn default_engine() -> ForecastEngine {
    ForecastEngine::new(&DashboardConfig::site_default())
}

/// A sample with the powerwall at 50%, a 1 kW load, and no vehicles.
pub fn base_sample(ts: NaiveDateTime) -> TelemetrySample {
    let mut s = TelemetrySample::at(ts);
    s.battery_percentage = Some(50.0);
    s.load_power_kw = Some(1.0);
    s.grid_power_kw = Some(0.0);
    s.solar_power_kw = Some(0.0);
    s
}

/// A full day of quarter-hour samples reporting flat solar production,
/// for use as the yesterday window.
pub fn flat_solar_day(date: NaiveDate, kw: f32) -> Vec<TelemetrySample> {
    let midnight = at(date, 0, 0);
    (0..96)
        .map(|q| {
            let mut s = TelemetrySample::at(midnight + Duration::minutes(15 * q));
            s.solar_power_kw = Some(kw);
            s
        })
        .collect()
}
