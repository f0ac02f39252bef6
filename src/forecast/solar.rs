use chrono::{Duration, NaiveDateTime};

use crate::feed::TelemetrySample;

/// Estimates solar production at `target` from the sample closest to the same
/// time yesterday.
///
/// Scans `yesterday` for the sample whose timestamp is nearest `target - 24h`
/// within `tolerance_min` minutes, and returns its reported production.
/// Returns 0 when no sample matches or the matched sample carries no solar
/// reading. Ties go to the earlier sample.
pub fn yesterday_solar_kw(
    yesterday: &[TelemetrySample],
    target: NaiveDateTime,
    tolerance_min: u32,
) -> f32 {
    let wanted = target - Duration::hours(24);
    let tolerance = Duration::minutes(i64::from(tolerance_min));

    let mut best: Option<(Duration, f32)> = None;
    for s in yesterday {
        let dist = (s.local_timestamp - wanted).abs();
        if dist > tolerance {
            continue;
        }
        let keep = match best {
            Some((d, _)) => dist < d,
            None => true,
        };
        if keep {
            best = Some((dist, s.solar_power_kw.unwrap_or(0.0)));
        }
    }
    best.map_or(0.0, |(_, kw)| kw)
}
