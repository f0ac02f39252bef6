//! End-to-end behavioral tests for the forecast engine.

mod common;

use chrono::Duration;

use powerdash::config::DashboardConfig;
use powerdash::forecast::{ChargingOverride, ForecastEngine, yesterday_solar_kw};

use common::{at, base_sample, default_engine, flat_solar_day, weekday, weekend};

#[test]
fn forecast_starts_on_next_boundary_and_ends_at_day_end() {
    let day = weekday();
    let today = vec![base_sample(at(day, 12, 0))];
    let series = default_engine().run(&today, &[], at(day, 12, 0), None);

    // exactly on a boundary still advances to the next one
    assert_eq!(series.labels.first().map(String::as_str), Some("12:15 PM"));
    assert_eq!(series.labels.last().map(String::as_str), Some("11:45 PM"));
    assert_eq!(series.len(), 47);
    assert_eq!(series.powerwall.len(), series.len());
    assert_eq!(series.model3.len(), series.len());
    assert_eq!(series.modelx.len(), series.len());
}

#[test]
fn forecast_is_deterministic() {
    let day = weekday();
    let mut seed = base_sample(at(day, 9, 0));
    seed.model3_battery = Some(40.0);
    let today = vec![seed];
    let yesterday = flat_solar_day(day - Duration::days(1), 4.0);

    let engine = default_engine();
    let a = engine.run(&today, &yesterday, at(day, 9, 0), None);
    let b = engine.run(&today, &yesterday, at(day, 9, 0), None);
    assert_eq!(a.labels, b.labels);
    assert_eq!(a.powerwall, b.powerwall);
    assert_eq!(a.model3, b.model3);
}

#[test]
fn yesterday_solar_drives_the_replay() {
    let day = weekday();
    let mut seed = base_sample(at(day, 10, 0));
    seed.load_power_kw = Some(0.0);
    let yesterday = flat_solar_day(day - Duration::days(1), 3.0);
    let series = default_engine().run(&[seed], &yesterday, at(day, 10, 0), None);

    // 3 kW surplus for 15 min on a 13.5 kWh pack
    let expected = 50.0 + 3.0 * 0.25 / 13.5 * 100.0;
    assert!((series.powerwall[0] - expected).abs() < 1e-3);
}

#[test]
fn solar_lookup_falls_back_to_zero() {
    let day = weekday();
    let yesterday = flat_solar_day(day - Duration::days(1), 3.0);
    // 12:07 is more than 5 minutes from both 12:00 and 12:15
    assert_eq!(yesterday_solar_kw(&yesterday, at(day, 12, 7), 5), 0.0);
    assert_eq!(yesterday_solar_kw(&yesterday, at(day, 12, 15), 5), 3.0);
    assert_eq!(yesterday_solar_kw(&[], at(day, 12, 15), 5), 0.0);
}

#[test]
fn powerwall_stays_within_bounds_under_extremes() {
    let day = weekday();
    let mut surplus_seed = base_sample(at(day, 6, 0));
    surplus_seed.battery_percentage = Some(95.0);
    surplus_seed.load_power_kw = Some(0.0);
    let sunny = flat_solar_day(day - Duration::days(1), 11.0);
    let charged = default_engine().run(&[surplus_seed], &sunny, at(day, 6, 0), None);
    assert!(charged.powerwall.iter().all(|&p| p <= 100.0));
    assert_eq!(*charged.powerwall.last().unwrap(), 100.0);

    let mut deficit_seed = base_sample(at(day, 6, 0));
    deficit_seed.battery_percentage = Some(5.0);
    deficit_seed.load_power_kw = Some(8.0);
    let drained = default_engine().run(&[deficit_seed], &[], at(day, 6, 0), None);
    assert!(drained.powerwall.iter().all(|&p| p >= 0.0));
    assert_eq!(*drained.powerwall.last().unwrap(), 0.0);
}

#[test]
fn vehicle_gain_follows_the_charger_power() {
    let day = weekend(); // no cutoff in play
    let mut seed = base_sample(at(day, 8, 0));
    seed.model3_battery = Some(40.0);
    seed.model3_is_charging = Some(true);
    seed.model3_charge_amps = Some(32);
    let series = default_engine().run(&[seed], &[], at(day, 8, 0), None);

    // 32 A * 249 V = 7.968 kW; 1.992 kWh per quarter hour; 3.8015% of 52.4 kWh
    let expected = 40.0 + 7.968 * 0.25 / 52.4 * 100.0;
    let got = series.model3[0].unwrap();
    assert!((got - expected).abs() < 1e-3, "got {got}, want {expected}");
}

#[test]
fn weekday_cutoff_applies_only_to_observed_model3_charging() {
    let day = weekday();
    let mut seed = base_sample(at(day, 13, 0));
    seed.model3_battery = Some(40.0);
    seed.model3_is_charging = Some(true);
    seed.model3_charge_amps = Some(32);
    seed.model_x_battery = Some(40.0);
    seed.model_x_is_charging = Some(true);
    seed.model_x_charge_amps = Some(24);
    let series = default_engine().run(&[seed], &[], at(day, 13, 0), None);

    // 13:15 through 14:00 charge; nothing from 14:15 on
    let soc_at_14_00 = series.model3[3].unwrap();
    assert!(soc_at_14_00 > 40.0);
    assert_eq!(series.model3.last().unwrap().unwrap(), soc_at_14_00);
    // the Model X keeps charging past the cutoff
    let x_at_14_00 = series.modelx[3].unwrap();
    assert!(series.modelx[5].unwrap() > x_at_14_00);
}

#[test]
fn override_keeps_charging_past_the_cutoff() {
    let day = weekday();
    let mut seed = base_sample(at(day, 13, 0));
    seed.model3_battery = Some(40.0);
    let ov = ChargingOverride {
        model3_amps: 20,
        modelx_amps: 0,
    };
    let series = default_engine().run(&[seed], &[], at(day, 13, 0), Some(&ov));
    let soc_at_14_00 = series.model3[3].unwrap();
    assert!(series.model3[5].unwrap() > soc_at_14_00);
}

#[test]
fn hitting_the_limit_spills_into_the_powerwall() {
    let day = weekend();
    let mut seed = base_sample(at(day, 8, 0));
    seed.load_power_kw = Some(7.968);
    seed.model3_battery = Some(89.0);
    seed.model3_is_charging = Some(true);
    seed.model3_charge_amps = Some(32);
    seed.model3_charge_limit = Some(90.0);
    let series = default_engine().run(&[seed], &[], at(day, 8, 0), None);

    // the pack tops out on the first step and never exceeds its limit
    assert_eq!(series.model3[0], Some(90.0));
    assert!(series.model3.iter().flatten().all(|&p| p <= 90.0));

    // 2.8015% overshoot of 52.4 kWh flows back into the powerwall, mostly
    // cancelling the 1.992 kWh the step drew
    let overshoot_kwh = (40.0 + 7.968 * 0.25 / 52.4 * 100.0 - 90.0 - (40.0 - 89.0)) / 100.0 * 52.4;
    let expected = (6.75 - 1.992 + overshoot_kwh) / 13.5 * 100.0;
    assert!(
        (series.powerwall[0] - expected).abs() < 1e-2,
        "got {}, want {expected}",
        series.powerwall[0]
    );

    // afterwards only the idle floor load remains
    let step_drain = series.powerwall[1] - series.powerwall[2];
    let floor_drain = 0.234 * 0.25 / 13.5 * 100.0;
    assert!((step_drain - floor_drain).abs() < 1e-3);
}

#[test]
fn spillover_never_lowers_the_powerwall_trajectory() {
    let day = weekend();
    let mut seed = base_sample(at(day, 8, 0));
    seed.load_power_kw = Some(7.968);
    seed.model3_battery = Some(89.0);
    seed.model3_is_charging = Some(true);
    seed.model3_charge_amps = Some(32);
    seed.model3_charge_limit = Some(90.0);

    let mut uncapped_seed = seed.clone();
    uncapped_seed.model3_charge_limit = Some(100.0);

    let engine = default_engine();
    let capped = engine.run(&[seed], &[], at(day, 8, 0), None);
    let uncapped = engine.run(&[uncapped_seed], &[], at(day, 8, 0), None);

    // once the 90% limit is hit, the reclaimed overcharge keeps the capped
    // run's powerwall at or above the uncapped run's
    for (c, u) in capped.powerwall.iter().zip(&uncapped.powerwall) {
        assert!(c + 1e-4 >= *u, "capped {c} fell below uncapped {u}");
    }
    assert!(capped.powerwall[1] > uncapped.powerwall[1]);
}

#[test]
fn override_supersedes_not_charging_telemetry() {
    let day = weekend();
    let mut seed = base_sample(at(day, 8, 0));
    seed.model_x_battery = Some(50.0);
    seed.model_x_is_charging = Some(false);
    let ov = ChargingOverride {
        model3_amps: 0,
        modelx_amps: 16,
    };
    let series = default_engine().run(&[seed], &[], at(day, 8, 0), Some(&ov));
    assert!(series.modelx[0].unwrap() > 50.0);
    assert!(series.modelx[4].unwrap() > series.modelx[0].unwrap());
}

#[test]
fn absent_vehicles_produce_null_series() {
    let day = weekday();
    let today = vec![base_sample(at(day, 12, 0))];
    let series = default_engine().run(&today, &[], at(day, 12, 0), None);
    assert!(series.model3.iter().all(Option::is_none));
    assert!(series.modelx.iter().all(Option::is_none));
    assert!(!series.powerwall.is_empty());
}

#[test]
fn empty_feed_and_late_seed_give_empty_series() {
    let day = weekday();
    let engine = default_engine();
    assert!(engine.run(&[], &[], at(day, 12, 0), None).is_empty());

    let late = vec![base_sample(at(day, 23, 50))];
    assert!(engine.run(&late, &[], at(day, 23, 50), None).is_empty());
}

#[test]
fn faster_amperage_reaches_the_limit_sooner() {
    let day = weekend();
    let mut seed = base_sample(at(day, 8, 0));
    seed.model3_battery = Some(40.0);
    let engine = default_engine();

    let slow = engine.run(
        &[seed.clone()],
        &[],
        at(day, 8, 0),
        Some(&ChargingOverride {
            model3_amps: 10,
            modelx_amps: 0,
        }),
    );
    let fast = engine.run(
        &[seed],
        &[],
        at(day, 8, 0),
        Some(&ChargingOverride {
            model3_amps: 32,
            modelx_amps: 0,
        }),
    );
    let first_full = |series: &powerdash::forecast::ForecastSeries| {
        series
            .model3
            .iter()
            .position(|p| p.is_some_and(|v| v >= 100.0))
    };
    match (first_full(&fast), first_full(&slow)) {
        (Some(f), Some(s)) => assert!(f < s),
        (Some(_), None) => {}
        other => panic!("fast charge should top out first: {other:?}"),
    }
}

#[test]
fn custom_step_length_changes_label_cadence() {
    let mut cfg = DashboardConfig::site_default();
    cfg.forecast.step_minutes = 30;
    let engine = ForecastEngine::new(&cfg);
    let day = weekday();
    let today = vec![base_sample(at(day, 12, 0))];
    let series = engine.run(&today, &[], at(day, 12, 0), None);
    assert_eq!(series.labels.first().map(String::as_str), Some("12:30 PM"));
    assert_eq!(series.labels.last().map(String::as_str), Some("11:30 PM"));
    assert_eq!(series.len(), 23);
}
