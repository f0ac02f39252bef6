//! Unit conversions and small formatting helpers shared across the dashboard.

use chrono::TimeDelta;

/// Converts a battery percentage into stored energy for a pack of the given capacity.
pub fn kwh_from_percent(percent: f32, capacity_kwh: f32) -> f32 {
    percent / 100.0 * capacity_kwh
}

/// Converts stored energy back into a percentage of the given pack capacity.
///
/// Returns 0.0 for a non-positive capacity rather than dividing by zero.
pub fn percent_from_kwh(kwh: f32, capacity_kwh: f32) -> f32 {
    if capacity_kwh <= 0.0 {
        return 0.0;
    }
    kwh / capacity_kwh * 100.0
}

/// Charger power in kW for a given current at a fixed charger voltage.
pub fn charger_power_kw(amps: u32, voltage_v: f32) -> f32 {
    amps as f32 * voltage_v / 1000.0
}

/// Hours needed to charge from `current_pct` to `target_pct` at a constant power.
///
/// Returns `None` when the pack is already at or past the target, or when no
/// charging power is applied.
pub fn hours_to_percent(
    current_pct: f32,
    target_pct: f32,
    capacity_kwh: f32,
    power_kw: f32,
) -> Option<f32> {
    if current_pct >= target_pct || power_kw <= 0.0 {
        return None;
    }
    let kwh_needed = (target_pct - current_pct) / 100.0 * capacity_kwh;
    Some(kwh_needed / power_kw)
}

/// Formats a fractional hour count as `"2h 5m"`, `"2h"`, or `"45m"`.
pub fn format_hours_hm(hours: f32) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - whole as f32) * 60.0).round() as i64;
    if whole > 0 && minutes > 0 {
        format!("{whole}h {minutes}m")
    } else if whole > 0 {
        format!("{whole}h")
    } else {
        format!("{minutes}m")
    }
}

/// Formats the age of a reading as `"5m ago"`, `"2h ago"`, or `"2h 5m ago"`.
pub fn format_time_ago(age: TimeDelta) -> String {
    let total_minutes = age.num_minutes().abs();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 && minutes > 0 {
        format!("{hours}h {minutes}m ago")
    } else if hours > 0 {
        format!("{hours}h ago")
    } else {
        format!("{minutes}m ago")
    }
}
