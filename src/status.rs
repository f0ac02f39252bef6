//! Current-conditions summary derived from the feed: the "status cards" a
//! front end renders above the forecast chart.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::feed::{TelemetrySample, Vehicle, last_vehicle_sample, through};
use crate::units::format_time_ago;

/// Snapshot of the site at a point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStatus {
    pub as_of: Option<NaiveDateTime>,
    pub solar_power_kw: Option<f32>,
    pub battery_power_kw: Option<f32>,
    pub battery_percentage: Option<f32>,
    pub grid_power_kw: Option<f32>,
    pub load_power_kw: Option<f32>,
    pub weather: WeatherStatus,
    pub thermostat: ThermostatStatus,
    pub model3: VehicleStatus,
    pub modelx: VehicleStatus,
}

/// Outdoor conditions from the latest sample.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherStatus {
    pub temperature_f: Option<f32>,
    pub conditions: Option<String>,
    pub humidity: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ThermostatStatus {
    pub online: bool,
    pub status: Option<String>,
    pub actively_running: bool,
    pub temperature_f: Option<f32>,
    pub target_temp_f: Option<f32>,
    pub mode: Option<String>,
    pub humidity: Option<f32>,
}

/// Vehicle card. When the vehicle is missing from the latest sample the
/// fields come from the most recent sample that saw it, with `last_seen`
/// saying how stale that is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleStatus {
    pub battery_percentage: Option<f32>,
    pub range_miles: Option<f32>,
    pub charging: bool,
    pub charge_amps: Option<u32>,
    pub charger_power_kw: Option<f32>,
    pub charge_limit: Option<f32>,
    pub charging_state: Option<String>,
    /// Humanized age of the data, e.g. "3h ago". `None` when current.
    pub last_seen: Option<String>,
}

impl DashboardStatus {
    /// Builds the snapshot from the samples at or before `now`.
    pub fn from_feed(samples: &[TelemetrySample], now: NaiveDateTime) -> Self {
        let seen = through(samples, now);
        let Some(latest) = seen.last() else {
            return Self::default();
        };

        Self {
            as_of: Some(latest.local_timestamp),
            solar_power_kw: latest.solar_power_kw,
            battery_power_kw: latest.battery_power_kw,
            battery_percentage: latest.battery_percentage,
            grid_power_kw: latest.grid_power_kw,
            load_power_kw: latest.load_power_kw,
            weather: WeatherStatus {
                temperature_f: latest.weather_temperature_f,
                conditions: latest.weather_conditions.clone(),
                humidity: latest.weather_humidity,
            },
            thermostat: ThermostatStatus {
                online: latest.thermostat_is_online.unwrap_or(false),
                status: latest.thermostat_status.clone(),
                actively_running: latest.thermostat_is_actively_running.unwrap_or(false),
                temperature_f: latest.thermostat_current_temp_f,
                target_temp_f: latest.thermostat_target_temp_f,
                mode: latest.thermostat_mode.clone(),
                humidity: latest.thermostat_humidity,
            },
            model3: vehicle_status(seen, latest, Vehicle::Model3, now),
            modelx: vehicle_status(seen, latest, Vehicle::ModelX, now),
        }
    }
}

fn vehicle_status(
    seen: &[TelemetrySample],
    latest: &TelemetrySample,
    v: Vehicle,
    now: NaiveDateTime,
) -> VehicleStatus {
    let (sample, last_seen) = if latest.vehicle_available(v) {
        (latest, None)
    } else {
        match last_vehicle_sample(seen, v, now) {
            Some((s, age)) => (s, Some(format_time_ago(age))),
            None => return VehicleStatus::default(),
        }
    };

    VehicleStatus {
        battery_percentage: sample.vehicle_battery(v),
        range_miles: sample.vehicle_range_miles(v),
        charging: sample.vehicle_is_charging(v),
        charge_amps: sample.vehicle_charge_amps(v),
        charger_power_kw: sample.vehicle_reported_charger_kw(v),
        charge_limit: Some(sample.vehicle_charge_limit(v)),
        charging_state: sample.vehicle_charging_state(v).map(str::to_string),
        last_seen,
    }
}

impl fmt::Display for DashboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Site Status ===")?;
        match self.as_of {
            Some(ts) => writeln!(f, "As of:       {}", ts.format("%Y-%m-%d %H:%M:%S"))?,
            None => writeln!(f, "As of:       (no data)")?,
        }
        writeln!(f, "Solar:       {}", fmt_kw(self.solar_power_kw))?;
        match self.battery_power_kw {
            Some(kw) => writeln!(
                f,
                "Powerwall:   {} ({kw:+.2} kW)",
                fmt_pct(self.battery_percentage)
            )?,
            None => writeln!(f, "Powerwall:   {}", fmt_pct(self.battery_percentage))?,
        }
        writeln!(f, "Grid:        {}", fmt_kw(self.grid_power_kw))?;
        writeln!(f, "Load:        {}", fmt_kw(self.load_power_kw))?;

        let w = &self.weather;
        write!(f, "Weather:     ")?;
        match w.temperature_f {
            Some(deg) => write!(f, "{deg:.0} F")?,
            None => write!(f, "-")?,
        }
        write!(f, ", {}", w.conditions.as_deref().unwrap_or("Unknown"))?;
        if let Some(hum) = w.humidity {
            write!(f, ", {hum:.0}% RH")?;
        }
        writeln!(f)?;

        let t = &self.thermostat;
        if t.online {
            let mode = t.status.as_deref().unwrap_or("-");
            let run = if t.actively_running { "running" } else { "idle" };
            write!(f, "Thermostat:  {mode} ({run})")?;
            if let Some(deg) = t.temperature_f {
                write!(f, ", {deg:.1} F")?;
            }
            if let Some(target) = t.target_temp_f {
                let mode = t.mode.as_deref().unwrap_or("OFF");
                write!(f, " (set {target:.0} F {mode})")?;
            }
            if let Some(hum) = t.humidity {
                write!(f, ", {hum:.0}% RH")?;
            }
            writeln!(f)?;
        } else {
            writeln!(f, "Thermostat:  offline")?;
        }

        for (name, v) in [("Model 3", &self.model3), ("Model X", &self.modelx)] {
            write!(f, "{name}:     {}", fmt_pct(v.battery_percentage))?;
            if let Some(miles) = v.range_miles {
                write!(f, ", {miles:.0} mi")?;
            }
            if v.charging {
                let amps = v.charge_amps.unwrap_or(0);
                let limit = v.charge_limit.unwrap_or(100.0);
                write!(f, ", charging at {amps} A to {limit:.0}%")?;
            } else if let Some(state) = &v.charging_state {
                write!(f, ", {state}")?;
            }
            if let Some(ago) = &v.last_seen {
                write!(f, " (as of {ago})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn fmt_kw(v: Option<f32>) -> String {
    match v {
        Some(kw) => format!("{kw:.2} kW"),
        None => "-".to_string(),
    }
}

fn fmt_pct(v: Option<f32>) -> String {
    match v {
        Some(pct) => format!("{pct:.1}%"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn empty_feed_gives_blank_status() {
        let status = DashboardStatus::from_feed(&[], ts(12, 0));
        assert!(status.as_of.is_none());
        assert!(status.model3.battery_percentage.is_none());
    }

    #[test]
    fn latest_sample_populates_cards() {
        let mut s = TelemetrySample::at(ts(12, 0));
        s.solar_power_kw = Some(6.2);
        s.battery_percentage = Some(55.0);
        s.model3_battery = Some(62.0);
        s.model3_is_charging = Some(true);
        s.model3_charge_amps = Some(32);
        let status = DashboardStatus::from_feed(&[s], ts(12, 30));
        assert_eq!(status.as_of, Some(ts(12, 0)));
        assert_eq!(status.model3.battery_percentage, Some(62.0));
        assert!(status.model3.charging);
        assert!(status.model3.last_seen.is_none());
    }

    #[test]
    fn offline_vehicle_falls_back_with_age() {
        let mut old = TelemetrySample::at(ts(8, 0));
        old.model_x_battery = Some(47.0);
        let mut latest = TelemetrySample::at(ts(12, 0));
        latest.battery_percentage = Some(55.0);
        let status = DashboardStatus::from_feed(&[old, latest], ts(12, 0));
        assert_eq!(status.modelx.battery_percentage, Some(47.0));
        assert_eq!(status.modelx.last_seen.as_deref(), Some("4h ago"));
    }

    #[test]
    fn samples_after_now_are_ignored() {
        let mut future = TelemetrySample::at(ts(18, 0));
        future.battery_percentage = Some(99.0);
        let mut past = TelemetrySample::at(ts(10, 0));
        past.battery_percentage = Some(40.0);
        let status = DashboardStatus::from_feed(&[past, future], ts(12, 0));
        assert_eq!(status.battery_percentage, Some(40.0));
    }

    #[test]
    fn weather_and_thermostat_detail_fill_their_cards() {
        let mut s = TelemetrySample::at(ts(12, 0));
        s.weather_temperature_f = Some(91.0);
        s.weather_conditions = Some("Partly Cloudy".to_string());
        s.weather_humidity = Some(63.0);
        s.thermostat_is_online = Some(true);
        s.thermostat_status = Some("Cooling".to_string());
        s.thermostat_current_temp_f = Some(74.5);
        s.thermostat_target_temp_f = Some(72.0);
        s.thermostat_mode = Some("COOL".to_string());
        s.thermostat_humidity = Some(48.0);
        let status = DashboardStatus::from_feed(&[s], ts(12, 0));
        assert_eq!(status.weather.temperature_f, Some(91.0));
        assert_eq!(status.weather.conditions.as_deref(), Some("Partly Cloudy"));
        assert_eq!(status.thermostat.target_temp_f, Some(72.0));
        assert_eq!(status.thermostat.mode.as_deref(), Some("COOL"));
        assert_eq!(status.thermostat.humidity, Some(48.0));
        let out = status.to_string();
        assert!(out.contains("91 F, Partly Cloudy, 63% RH"));
        assert!(out.contains("set 72 F COOL"));
    }

    #[test]
    fn display_renders_without_panicking() {
        let mut s = TelemetrySample::at(ts(12, 0));
        s.battery_percentage = Some(55.0);
        s.thermostat_is_online = Some(true);
        s.thermostat_status = Some("Cooling".to_string());
        let status = DashboardStatus::from_feed(&[s], ts(12, 0));
        let out = status.to_string();
        assert!(out.contains("55.0%"));
        assert!(out.contains("Cooling"));
    }
}
