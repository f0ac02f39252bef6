//! Feed-to-forecast integration: parse a JSON feed, slice it into day
//! windows, and run the full pipeline.

mod common;

use chrono::Duration;

use powerdash::feed::{Vehicle, day_slice, parse_feed};
use powerdash::io::export::write_csv;
use powerdash::status::DashboardStatus;
use powerdash::synth::synthetic_feed;

use common::{at, default_engine, weekday};

const FEED: &str = r#"[
    {
        "LocalTimestamp": "2023-07-03T11:58:00",
        "SolarPowerKw": 5.5,
        "BatteryPercentage": 61.0,
        "LoadPowerKw": 1.2
    },
    {
        "LocalTimestamp": "2023-07-04T08:00:00",
        "SolarPowerKw": 2.0,
        "BatteryPercentage": 42.0,
        "GridPowerKw": 0.0,
        "LoadPowerKw": 1.0,
        "ThermostatIsOnline": true,
        "ThermostatStatus": "Cooling",
        "ThermostatIsActivelyRunning": false,
        "Model3Battery": 55.0,
        "Model3IsCharging": false,
        "Model3ChargingState": "Stopped",
        "Model3EstimatedRangeMiles": 150.0
    },
    {
        "LocalTimestamp": "2023-07-04T11:55:00",
        "SolarPowerKw": 6.0,
        "BatteryPercentage": 58.0,
        "GridPowerKw": 0.0,
        "LoadPowerKw": 1.5,
        "Model3Battery": 57.0,
        "Model3IsCharging": false
    }
]"#;

#[test]
fn feed_parses_and_slices_into_days() {
    let samples = parse_feed(FEED).unwrap();
    assert_eq!(samples.len(), 3);

    let day = weekday();
    let midnight = at(day, 0, 0);
    let today = day_slice(&samples, midnight, midnight + Duration::days(1));
    let yesterday = day_slice(&samples, midnight - Duration::days(1), midnight);
    assert_eq!(today.len(), 2);
    assert_eq!(yesterday.len(), 1);
}

#[test]
fn pipeline_runs_from_raw_json() {
    let samples = parse_feed(FEED).unwrap();
    let day = weekday();
    let now = at(day, 12, 0);
    let midnight = at(day, 0, 0);
    let today = day_slice(&samples, midnight, midnight + Duration::days(1));
    let yesterday = day_slice(&samples, midnight - Duration::days(1), midnight);

    let series = default_engine().run(today, yesterday, now, None);
    assert_eq!(series.labels.first().map(String::as_str), Some("12:15 PM"));
    assert!(series.model3.iter().all(Option::is_some));
    // the Model X never appears in this feed
    assert!(series.modelx.iter().all(Option::is_none));

    // 12:15 today matches nothing yesterday within 5 minutes, but 11:55 is
    // within range of 11:58 yesterday for the noon-ish steps
    let status = DashboardStatus::from_feed(&samples, now);
    assert_eq!(status.battery_percentage, Some(58.0));
    assert_eq!(status.model3.battery_percentage, Some(57.0));
    assert!(status.modelx.battery_percentage.is_none());
}

#[test]
fn status_reports_stale_vehicle_age() {
    let samples = parse_feed(FEED).unwrap();
    let day = weekday();
    // late in the day the Model 3 card still shows the 11:55 reading
    let status = DashboardStatus::from_feed(&samples, at(day, 18, 0));
    assert_eq!(status.model3.battery_percentage, Some(57.0));
    assert!(status.model3.last_seen.is_none());

    // a feed whose latest sample lacks the vehicle marks the card stale
    let mut shifted = samples.clone();
    let mut extra = powerdash::feed::TelemetrySample::at(at(day, 18, 0));
    extra.battery_percentage = Some(40.0);
    shifted.push(extra);
    let status = DashboardStatus::from_feed(&shifted, at(day, 18, 0));
    assert_eq!(status.model3.battery_percentage, Some(57.0));
    assert_eq!(status.model3.last_seen.as_deref(), Some("6h 5m ago"));
}

#[test]
fn synthetic_feed_flows_through_export() {
    let day = weekday();
    let samples = synthetic_feed(day, 7);
    let now = at(day, 12, 0);
    let midnight = at(day, 0, 0);
    let today = day_slice(&samples, midnight, midnight + Duration::days(1));
    let yesterday = day_slice(&samples, midnight - Duration::days(1), midnight);

    let series = default_engine().run(today, yesterday, now, None);
    assert!(!series.is_empty());

    let mut out = Vec::new();
    write_csv(&series, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), series.len() + 1);
    assert!(text.starts_with("time,powerwall_pct"));
}

#[test]
fn synthetic_vehicles_match_presence_rules() {
    let day = weekday();
    let samples = synthetic_feed(day, 7);
    let noon = samples
        .iter()
        .find(|s| s.local_timestamp == at(day, 12, 0))
        .unwrap();
    assert!(noon.vehicle_available(Vehicle::Model3));
    assert!(!noon.vehicle_available(Vehicle::ModelX));
}
