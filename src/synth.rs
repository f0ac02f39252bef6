//! Seeded synthetic telemetry for demos and tests.
//!
//! Generates a plausible day of samples when no real feed is at hand: a
//! half-cosine solar curve between sunrise and sunset with Gaussian weather
//! noise, a noisy base load, and a powerwall trace that follows the surplus.

use chrono::{Duration, NaiveDate, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::feed::TelemetrySample;

/// Random value from a Gaussian distribution with mean 0 and the given
/// standard deviation (Box-Muller).
fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}

/// Half-cosine daylight fraction for an hour-of-day between sunrise and sunset.
fn daylight_frac(hour: f32, sunrise: f32, sunset: f32) -> f32 {
    if hour < sunrise || hour >= sunset {
        return 0.0;
    }
    let x = (hour - sunrise) / (sunset - sunrise);
    (std::f32::consts::PI * x).sin()
}

/// Generates one day of quarter-hour samples for `date`, reproducible from
/// `seed`.
pub fn synthetic_day(date: NaiveDate, seed: u64) -> Vec<TelemetrySample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(96);

    let kw_peak = 8.0;
    let mut powerwall_pct: f32 = 35.0;
    let mut model3_pct = 52.0 + gaussian_noise(&mut rng, 6.0);
    let modelx_pct = 64.0 + gaussian_noise(&mut rng, 6.0);

    let midnight = date.and_hms_opt(0, 0, 0);
    let Some(midnight) = midnight else {
        return samples;
    };

    for q in 0..96 {
        let ts = midnight + Duration::minutes(15 * q);
        let hour = ts.hour() as f32 + ts.minute() as f32 / 60.0;

        let daylight = daylight_frac(hour, 6.25, 20.0);
        let solar_kw = {
            let noise_mult = 1.0 + gaussian_noise(&mut rng, 0.08);
            (kw_peak * daylight * noise_mult).max(0.0)
        };

        // Base load with an evening bump.
        let mut load_kw = 0.9 + gaussian_noise(&mut rng, 0.15).abs();
        if (17.0..22.0).contains(&hour) {
            load_kw += 1.4;
        }

        // Afternoon cooling cycle.
        let cooling = (13.0..18.5).contains(&hour) && q % 4 < 2;
        if cooling {
            load_kw += 5.6;
        }

        // Midday telemetry-observed charging until the pack is comfortable.
        let model3_charging = (10.0..14.0).contains(&hour) && model3_pct < 80.0;
        let model3_amps = if model3_charging { 32 } else { 0 };
        let model3_kw = model3_amps as f32 * 249.0 / 1000.0;
        if model3_charging {
            load_kw += model3_kw;
            model3_pct = (model3_pct + model3_kw * 0.25 / 52.4 * 100.0).min(80.0);
        }

        let surplus_kw = solar_kw - load_kw;
        powerwall_pct = (powerwall_pct + surplus_kw.min(5.0) * 0.25 / 13.5 * 100.0)
            .clamp(0.0, 100.0);
        let grid_kw = if surplus_kw < 0.0 && powerwall_pct <= 0.0 {
            -surplus_kw
        } else {
            (-surplus_kw).min(0.0)
        };

        let mut s = TelemetrySample::at(ts);
        s.solar_power_kw = Some(solar_kw);
        s.battery_percentage = Some(powerwall_pct);
        s.grid_power_kw = Some(grid_kw);
        s.load_power_kw = Some(load_kw);
        s.thermostat_is_online = Some(true);
        s.thermostat_status = Some(if cooling { "Cooling" } else { "Off" }.to_string());
        s.thermostat_is_actively_running = Some(cooling);
        s.thermostat_current_temp_f = Some(72.0 + gaussian_noise(&mut rng, 1.5));
        s.thermostat_target_temp_f = Some(72.0);
        s.thermostat_mode = Some("COOL".to_string());
        s.thermostat_humidity = Some(45.0 + gaussian_noise(&mut rng, 3.0));

        s.weather_temperature_f = Some(68.0 + 24.0 * daylight + gaussian_noise(&mut rng, 2.0));
        s.weather_conditions = Some(if daylight > 0.0 { "Sunny" } else { "Clear" }.to_string());
        s.weather_humidity = Some(55.0 - 10.0 * daylight + gaussian_noise(&mut rng, 4.0));

        s.model3_battery = Some(model3_pct);
        s.model3_is_charging = Some(model3_charging);
        s.model3_charge_amps = Some(model3_amps);
        s.model3_charge_limit = Some(80.0);
        s.model3_charging_state = Some(
            if model3_charging { "Charging" } else { "Stopped" }.to_string(),
        );
        s.model3_estimated_range_miles = Some(model3_pct / 100.0 * 272.0);

        // The Model X leaves mid-morning and comes back for dinner.
        if !(9.0..17.5).contains(&hour) {
            s.model_x_battery = Some(modelx_pct);
            s.model_x_is_charging = Some(false);
            s.model_x_charge_amps = Some(0);
            s.model_x_charge_limit = Some(90.0);
            s.model_x_charging_state = Some("Disconnected".to_string());
            s.model_x_estimated_range_miles = Some(modelx_pct / 100.0 * 330.0);
        }

        samples.push(s);
    }

    samples
}

/// Two consecutive synthetic days: yesterday seeded differently so the solar
/// replay has something slightly offset to look up.
pub fn synthetic_feed(today: NaiveDate, seed: u64) -> Vec<TelemetrySample> {
    let mut feed = synthetic_day(today - Duration::days(1), seed ^ 0x9e37_79b9);
    feed.extend(synthetic_day(today, seed));
    feed
}
