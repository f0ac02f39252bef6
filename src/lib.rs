//! Home-energy dashboard core: telemetry feed ingestion, end-of-day battery
//! forecasting, and status reporting for a solar + powerwall + two-EV household.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod feed;
/// Battery-state forecasting engine and its solar-delta estimator.
pub mod forecast;
pub mod io;
pub mod status;
pub mod synth;
pub mod units;
