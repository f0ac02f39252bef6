use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::config::DashboardConfig;
use crate::feed::{TelemetrySample, Vehicle, through};
use crate::units::{charger_power_kw, kwh_from_percent, percent_from_kwh};

use super::solar::yesterday_solar_kw;
use super::types::{ChargingOverride, ForecastSeries};

/// Forward-stepping battery forecaster.
///
/// Seeds its state from the latest telemetry sample, then walks quarter-hour
/// boundaries to the end of the day. Each step replays yesterday's solar
/// production at the same clock time, derives the house load from the seeding
/// sample, charges the powerwall with the surplus, and steps both vehicle
/// packs.
pub struct ForecastEngine {
    powerwall_capacity_kwh: f32,
    model3: VehicleParams,
    modelx: VehicleParams,
    thermostat_running_kw: f32,
    thermostat_fan_kw: f32,
    step_minutes: u32,
    max_charge_kw: f32,
    idle_floor_kw: f32,
    solar_tolerance_min: u32,
    cutoff: NaiveTime,
}

struct VehicleParams {
    capacity_kwh: f32,
    voltage_v: f32,
}

/// Per-vehicle simulation state.
struct VehicleSim {
    available: bool,
    percent: f32,
    capacity_kwh: f32,
    charger_kw: f32,
    charging: bool,
    limit_pct: f32,
    /// Charging state came from telemetry (subject to the weekday cutoff)
    /// rather than from an explicit override.
    from_telemetry: bool,
}

/// Result of a vehicle reaching its charge limit mid-step.
struct LimitHit {
    /// Energy charged past the limit, returned to the powerwall.
    overcharge_kwh: f32,
    /// Charger draw that disappears from the house load.
    released_kw: f32,
}

impl VehicleSim {
    fn seed(
        latest: &TelemetrySample,
        vehicle: Vehicle,
        params: &VehicleParams,
        overrides: Option<&ChargingOverride>,
    ) -> Self {
        let available = latest.vehicle_available(vehicle);
        let percent = latest.vehicle_battery(vehicle).unwrap_or(0.0);
        let limit_pct = latest.vehicle_charge_limit(vehicle).min(100.0);

        let (charger_kw, charging, from_telemetry) = match overrides {
            Some(o) => {
                let amps = o.amps_for(vehicle);
                (charger_power_kw(amps, params.voltage_v), amps > 0, false)
            }
            None => (
                latest.vehicle_charger_kw(vehicle, params.voltage_v),
                latest.vehicle_is_charging(vehicle),
                true,
            ),
        };

        Self {
            available,
            percent,
            capacity_kwh: params.capacity_kwh,
            charger_kw,
            charging,
            limit_pct,
            from_telemetry,
        }
    }

    /// Charger draw at step time `t`, honoring the off-peak cutoff when the
    /// charging state came from telemetry.
    fn power_at(&self, t: NaiveTime, cutoff: Option<NaiveTime>) -> f32 {
        if !self.available || !self.charging {
            return 0.0;
        }
        if self.from_telemetry && cutoff.is_some_and(|c| t >= c) {
            return 0.0;
        }
        self.charger_kw
    }

    /// Advances the pack by one step at the given draw. Returns the limit-hit
    /// record when the pack tops out this step.
    fn advance(&mut self, power_kw: f32, dt_hours: f32) -> Option<LimitHit> {
        if power_kw <= 0.0 || !self.available {
            return None;
        }
        let gain_pct = percent_from_kwh(power_kw * dt_hours, self.capacity_kwh);
        let raw = self.percent + gain_pct;
        if raw < self.limit_pct {
            self.percent = raw;
            return None;
        }
        let overcharge_kwh = kwh_from_percent(raw - self.limit_pct, self.capacity_kwh);
        self.percent = self.limit_pct;
        self.charging = false;
        Some(LimitHit {
            overcharge_kwh,
            released_kw: self.charger_kw,
        })
    }
}

impl ForecastEngine {
    pub fn new(config: &DashboardConfig) -> Self {
        let cutoff = NaiveTime::from_hms_opt(
            config.forecast.cutoff_hour.min(23),
            config.forecast.cutoff_minute.min(59),
            0,
        )
        .unwrap_or(NaiveTime::MIN);
        Self {
            powerwall_capacity_kwh: config.powerwall.capacity_kwh,
            model3: VehicleParams {
                capacity_kwh: config.model3.capacity_kwh,
                voltage_v: config.model3.voltage_v,
            },
            modelx: VehicleParams {
                capacity_kwh: config.modelx.capacity_kwh,
                voltage_v: config.modelx.voltage_v,
            },
            thermostat_running_kw: config.thermostat.running_kw,
            thermostat_fan_kw: config.thermostat.fan_kw,
            // A zero step would divide by zero in the boundary math; validate()
            // rejects it, but the engine tolerates an unvalidated config.
            step_minutes: config.forecast.step_minutes.max(1),
            max_charge_kw: config.forecast.max_powerwall_charge_kw,
            idle_floor_kw: config.forecast.house_idle_floor_kw,
            solar_tolerance_min: config.forecast.solar_lookup_tolerance_min,
            cutoff,
        }
    }

    /// Runs the simulation from the latest sample at or before `now` through
    /// the last step boundary of the day.
    ///
    /// `today` holds the current day's samples (sorted ascending), `yesterday`
    /// the previous day's for the solar replay. Returns an empty series when
    /// no sample precedes `now`.
    pub fn run(
        &self,
        today: &[TelemetrySample],
        yesterday: &[TelemetrySample],
        now: NaiveDateTime,
        overrides: Option<&ChargingOverride>,
    ) -> ForecastSeries {
        let Some(latest) = through(today, now).last() else {
            return ForecastSeries::default();
        };

        let mut powerwall_kwh = kwh_from_percent(
            latest.battery_percentage.unwrap_or(0.0),
            self.powerwall_capacity_kwh,
        );
        let mut load_ref_kw = latest.load_power_kw.unwrap_or(0.0);
        let grid_credit_kw = latest.grid_power_kw.unwrap_or(0.0).max(0.0);
        let thermostat_kw = self.thermostat_draw(latest);

        let mut model3 = VehicleSim::seed(latest, Vehicle::Model3, &self.model3, overrides);
        let mut modelx = VehicleSim::seed(latest, Vehicle::ModelX, &self.modelx, overrides);

        // Off-peak rates end mid-afternoon on weekdays; observed charging is
        // assumed to stop then.
        let weekday = !matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        let model3_cutoff = weekday.then_some(self.cutoff);

        let dt_hours = self.step_minutes as f32 / 60.0;
        let mut series = ForecastSeries::default();

        let Some(mut t) = self.first_step_after(now) else {
            return series;
        };
        let end = match now.date().and_hms_opt(23, 59, 59) {
            Some(e) => e,
            None => return series,
        };

        while t <= end {
            let solar_kw = yesterday_solar_kw(yesterday, t, self.solar_tolerance_min);

            let model3_kw = model3.power_at(t.time(), model3_cutoff);
            let modelx_kw = modelx.power_at(t.time(), None);

            let house_kw = (load_ref_kw - thermostat_kw - model3_kw - modelx_kw).max(0.0);
            let consumption_kw = house_kw + thermostat_kw + model3_kw + modelx_kw;

            let rate_kw = (solar_kw - consumption_kw + grid_credit_kw).min(self.max_charge_kw);
            powerwall_kwh =
                (powerwall_kwh + rate_kw * dt_hours).clamp(0.0, self.powerwall_capacity_kwh);

            for (sim, kw) in [(&mut model3, model3_kw), (&mut modelx, modelx_kw)] {
                if let Some(hit) = sim.advance(kw, dt_hours) {
                    powerwall_kwh = (powerwall_kwh + hit.overcharge_kwh)
                        .clamp(0.0, self.powerwall_capacity_kwh);
                    load_ref_kw = (load_ref_kw - hit.released_kw).max(self.idle_floor_kw);
                }
            }

            series.labels.push(t.format("%I:%M %p").to_string());
            series
                .powerwall
                .push(percent_from_kwh(powerwall_kwh, self.powerwall_capacity_kwh));
            series
                .model3
                .push(model3.available.then_some(model3.percent));
            series
                .modelx
                .push(modelx.available.then_some(modelx.percent));

            t += Duration::minutes(i64::from(self.step_minutes));
        }

        series
    }

    /// 0 when offline or switched off, full draw while heating or cooling,
    /// fan-only draw otherwise.
    fn thermostat_draw(&self, latest: &TelemetrySample) -> f32 {
        if !latest.thermostat_is_online.unwrap_or(false) {
            return 0.0;
        }
        if latest
            .thermostat_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("off"))
        {
            return 0.0;
        }
        if latest.thermostat_is_actively_running.unwrap_or(false) {
            self.thermostat_running_kw
        } else {
            self.thermostat_fan_kw
        }
    }

    /// First step boundary strictly after `now`. A timestamp landing exactly
    /// on a boundary still advances to the next one.
    fn first_step_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let step = i64::from(self.step_minutes);
        let elapsed = i64::from(now.hour()) * 60 + i64::from(now.minute());
        let first = (elapsed / step + 1) * step;
        if first >= 24 * 60 {
            return None;
        }
        Some(now.date().and_time(NaiveTime::MIN) + Duration::minutes(first))
    }
}
