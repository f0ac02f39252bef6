use serde::Serialize;

use crate::feed::Vehicle;

/// A what-if charging request: both vehicles plugged in at fixed amperages
/// for the rest of the day, replacing whatever the telemetry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargingOverride {
    pub model3_amps: u32,
    pub modelx_amps: u32,
}

impl ChargingOverride {
    pub fn amps_for(&self, v: Vehicle) -> u32 {
        match v {
            Vehicle::Model3 => self.model3_amps,
            Vehicle::ModelX => self.modelx_amps,
        }
    }
}

/// Forecast output: one entry per simulation step, aligned across all series.
///
/// Vehicle entries are `None` when the vehicle was absent from the seeding
/// sample, so a renderer can show a gap rather than a fabricated value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastSeries {
    /// Step times formatted as "04:15 PM".
    pub labels: Vec<String>,
    /// Powerwall state of charge (percent) after each step.
    pub powerwall: Vec<f32>,
    /// Model 3 state of charge (percent) after each step.
    pub model3: Vec<Option<f32>>,
    /// Model X state of charge (percent) after each step.
    pub modelx: Vec<Option<f32>>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
