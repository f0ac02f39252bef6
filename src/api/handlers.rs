//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, NaiveDateTime};

use super::AppState;
use super::types::{ErrorResponse, ForecastQuery, StatusQuery};
use crate::config::VehicleConfig;
use crate::feed::{TelemetrySample, day_slice};
use crate::forecast::{ChargingOverride, ForecastEngine, ForecastSeries};
use crate::status::DashboardStatus;

/// Returns the current-conditions snapshot.
///
/// `GET /status` → 200 + `DashboardStatus` JSON
/// `GET /status?at=2023-07-04T12:00:00` → snapshot as of that time
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    let Some(now) = resolve_now(&state.samples, query.at) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "feed is empty".to_string(),
            }),
        ));
    };
    Ok(Json(DashboardStatus::from_feed(&state.samples, now)))
}

/// Returns the end-of-day battery forecast.
///
/// `GET /forecast` → 200 + `ForecastSeries` JSON
/// `GET /forecast?model3_amps=32&modelx_amps=0` → what-if override forecast
/// Out-of-range amperage → 400 + `ErrorResponse`
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
) -> impl IntoResponse {
    let Some(now) = resolve_now(&state.samples, query.at) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "feed is empty".to_string(),
            }),
        ));
    };

    let overrides = match build_override(&state, &query) {
        Ok(o) => o,
        Err(e) => return Err((StatusCode::BAD_REQUEST, Json(e))),
    };

    let (today, yesterday) = day_windows(&state.samples, now);
    let engine = ForecastEngine::new(&state.config);
    let series: ForecastSeries = engine.run(today, yesterday, now, overrides.as_ref());
    Ok(Json(series))
}

/// Resolves the evaluation time: the query parameter, or the latest feed
/// timestamp. `None` when the feed is empty and no time was given.
fn resolve_now(samples: &[TelemetrySample], at: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    at.or_else(|| samples.last().map(|s| s.local_timestamp))
}

/// Splits the feed into the evaluation day and the day before it.
fn day_windows(
    samples: &[TelemetrySample],
    now: NaiveDateTime,
) -> (&[TelemetrySample], &[TelemetrySample]) {
    let midnight = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    let today = day_slice(samples, midnight, midnight + Duration::days(1));
    let yesterday = day_slice(samples, midnight - Duration::days(1), midnight);
    (today, yesterday)
}

fn build_override(
    state: &AppState,
    query: &ForecastQuery,
) -> Result<Option<ChargingOverride>, ErrorResponse> {
    if query.model3_amps.is_none() && query.modelx_amps.is_none() {
        return Ok(None);
    }
    let model3_amps = query.model3_amps.unwrap_or(0);
    let modelx_amps = query.modelx_amps.unwrap_or(0);
    check_amps("model3_amps", model3_amps, &state.config.model3)?;
    check_amps("modelx_amps", modelx_amps, &state.config.modelx)?;
    Ok(Some(ChargingOverride {
        model3_amps,
        modelx_amps,
    }))
}

/// Zero amps means "not charging"; anything else must sit in the charger's
/// selectable range.
fn check_amps(name: &str, amps: u32, v: &VehicleConfig) -> Result<(), ErrorResponse> {
    if amps == 0 || (v.min_amps..=v.max_amps).contains(&amps) {
        Ok(())
    } else {
        Err(ErrorResponse {
            error: format!(
                "`{name}` ({amps}) must be 0 or between {} and {}",
                v.min_amps, v.max_amps
            ),
        })
    }
}
