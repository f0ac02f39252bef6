//! Telemetry feed: sample model, JSON parsing, and time-window helpers.
//!
//! A feed is a JSON array of samples collected a few times per hour from the
//! site gateway. Every field except the timestamp is optional, since each
//! collector (powerwall, thermostat, vehicles) can be offline independently.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::units::charger_power_kw;

/// One telemetry sample. Field names follow the gateway's JSON keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TelemetrySample {
    /// Collection time in the site's local timezone.
    pub local_timestamp: NaiveDateTime,

    /// Solar production (kW).
    pub solar_power_kw: Option<f32>,
    /// Powerwall flow (kW); negative while the powerwall charges.
    pub battery_power_kw: Option<f32>,
    /// Powerwall state of charge (percent).
    pub battery_percentage: Option<f32>,
    /// Grid import (positive) or export (negative) (kW).
    pub grid_power_kw: Option<f32>,
    /// Total household consumption (kW).
    pub load_power_kw: Option<f32>,

    pub thermostat_is_online: Option<bool>,
    /// Thermostat mode string as reported (e.g. "Cooling", "Off").
    pub thermostat_status: Option<String>,
    pub thermostat_is_actively_running: Option<bool>,
    /// Indoor temperature (degrees F).
    pub thermostat_current_temp_f: Option<f32>,
    pub thermostat_target_temp_f: Option<f32>,
    /// Configured mode (e.g. "COOL", "HEAT", "OFF"), distinct from the
    /// live status string above.
    pub thermostat_mode: Option<String>,
    pub thermostat_humidity: Option<f32>,

    pub weather_temperature_f: Option<f32>,
    pub weather_conditions: Option<String>,
    pub weather_humidity: Option<f32>,

    pub model3_is_available: Option<bool>,
    pub model3_battery: Option<f32>,
    pub model3_is_charging: Option<bool>,
    pub model3_charge_amps: Option<u32>,
    pub model3_charger_power_kw: Option<f32>,
    pub model3_charge_limit: Option<f32>,
    pub model3_charging_state: Option<String>,
    pub model3_estimated_range_miles: Option<f32>,

    pub model_x_is_available: Option<bool>,
    pub model_x_battery: Option<f32>,
    pub model_x_is_charging: Option<bool>,
    pub model_x_charge_amps: Option<u32>,
    pub model_x_charger_power_kw: Option<f32>,
    pub model_x_charge_limit: Option<f32>,
    pub model_x_charging_state: Option<String>,
    pub model_x_estimated_range_miles: Option<f32>,
}

impl TelemetrySample {
    /// Returns an empty sample at the given time.
    pub fn at(ts: NaiveDateTime) -> Self {
        Self {
            local_timestamp: ts,
            ..Self::default()
        }
    }
}

/// Which vehicle a field accessor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vehicle {
    Model3,
    ModelX,
}

impl Vehicle {
    pub const ALL: [Vehicle; 2] = [Vehicle::Model3, Vehicle::ModelX];
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vehicle::Model3 => write!(f, "Model 3"),
            Vehicle::ModelX => write!(f, "Model X"),
        }
    }
}

impl TelemetrySample {
    /// A vehicle counts as present when the collector says so, falling back
    /// to whether a battery level was reported for feeds predating the
    /// availability flag.
    pub fn vehicle_available(&self, v: Vehicle) -> bool {
        let flag = match v {
            Vehicle::Model3 => self.model3_is_available,
            Vehicle::ModelX => self.model_x_is_available,
        };
        flag.unwrap_or_else(|| self.vehicle_battery(v).is_some())
    }

    pub fn vehicle_battery(&self, v: Vehicle) -> Option<f32> {
        match v {
            Vehicle::Model3 => self.model3_battery,
            Vehicle::ModelX => self.model_x_battery,
        }
    }

    pub fn vehicle_is_charging(&self, v: Vehicle) -> bool {
        match v {
            Vehicle::Model3 => self.model3_is_charging,
            Vehicle::ModelX => self.model_x_is_charging,
        }
        .unwrap_or(false)
    }

    pub fn vehicle_charge_amps(&self, v: Vehicle) -> Option<u32> {
        match v {
            Vehicle::Model3 => self.model3_charge_amps,
            Vehicle::ModelX => self.model_x_charge_amps,
        }
    }

    /// Charger draw implied by the sampled amperage, or 0 when not charging.
    ///
    /// Deliberately derived from amps rather than the collector's
    /// `ChargerPowerKw` reading, so forecasts and what-if overrides share one
    /// formula.
    pub fn vehicle_charger_kw(&self, v: Vehicle, voltage_v: f32) -> f32 {
        if self.vehicle_is_charging(v) {
            self.vehicle_charge_amps(v)
                .map(|a| charger_power_kw(a, voltage_v))
                .unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Charger power as measured by the collector, when reported.
    pub fn vehicle_reported_charger_kw(&self, v: Vehicle) -> Option<f32> {
        match v {
            Vehicle::Model3 => self.model3_charger_power_kw,
            Vehicle::ModelX => self.model_x_charger_power_kw,
        }
    }

    /// Charge limit (percent); the firmware defaults to 100 when unset.
    pub fn vehicle_charge_limit(&self, v: Vehicle) -> f32 {
        match v {
            Vehicle::Model3 => self.model3_charge_limit,
            Vehicle::ModelX => self.model_x_charge_limit,
        }
        .unwrap_or(100.0)
    }

    pub fn vehicle_charging_state(&self, v: Vehicle) -> Option<&str> {
        match v {
            Vehicle::Model3 => self.model3_charging_state.as_deref(),
            Vehicle::ModelX => self.model_x_charging_state.as_deref(),
        }
    }

    pub fn vehicle_range_miles(&self, v: Vehicle) -> Option<f32> {
        match v {
            Vehicle::Model3 => self.model3_estimated_range_miles,
            Vehicle::ModelX => self.model_x_estimated_range_miles,
        }
    }
}

/// Feed loading or parsing error.
#[derive(Debug)]
pub struct FeedError {
    pub message: String,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed error: {}", self.message)
    }
}

/// Parses a JSON feed and sorts it by timestamp ascending.
///
/// # Errors
///
/// Returns a `FeedError` when the JSON is malformed.
pub fn parse_feed(json: &str) -> Result<Vec<TelemetrySample>, FeedError> {
    let mut samples: Vec<TelemetrySample> = serde_json::from_str(json).map_err(|e| FeedError {
        message: e.to_string(),
    })?;
    samples.sort_by_key(|s| s.local_timestamp);
    Ok(samples)
}

/// Reads and parses a JSON feed file.
///
/// # Errors
///
/// Returns a `FeedError` when the file cannot be read or the JSON is malformed.
pub fn load_feed(path: &Path) -> Result<Vec<TelemetrySample>, FeedError> {
    let json = fs::read_to_string(path).map_err(|e| FeedError {
        message: format!("cannot read \"{}\": {e}", path.display()),
    })?;
    parse_feed(&json)
}

/// Returns the subrange of `samples` falling within `[start, end)`.
///
/// Requires `samples` sorted ascending by timestamp (as `parse_feed` leaves them).
pub fn day_slice(
    samples: &[TelemetrySample],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> &[TelemetrySample] {
    let lo = samples.partition_point(|s| s.local_timestamp < start);
    let hi = samples.partition_point(|s| s.local_timestamp < end);
    &samples[lo..hi]
}

/// Returns the samples at or before `at`.
pub fn through(samples: &[TelemetrySample], at: NaiveDateTime) -> &[TelemetrySample] {
    let hi = samples.partition_point(|s| s.local_timestamp <= at);
    &samples[..hi]
}

/// Finds the most recent sample in which the given vehicle was present,
/// together with its age relative to `now`.
pub fn last_vehicle_sample(
    samples: &[TelemetrySample],
    v: Vehicle,
    now: NaiveDateTime,
) -> Option<(&TelemetrySample, Duration)> {
    samples
        .iter()
        .rev()
        .find(|s| s.vehicle_available(v))
        .map(|s| (s, now - s.local_timestamp))
}
