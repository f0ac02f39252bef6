//! Battery-state forecasting: forward-stepping simulation of the powerwall
//! and both vehicles from the latest telemetry through the end of the day.

mod engine;
mod solar;
mod types;

pub use engine::ForecastEngine;
pub use solar::yesterday_solar_kw;
pub use types::{ChargingOverride, ForecastSeries};
