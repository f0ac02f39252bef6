//! API query and response types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Optional evaluation-time parameter shared by both endpoints.
///
/// `at` defaults to the latest feed timestamp, so a static feed file serves a
/// sensible dashboard without the caller knowing its time range.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Evaluation time (`2023-07-04T12:00:00`).
    pub at: Option<NaiveDateTime>,
}

/// Query parameters for the forecast endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Evaluation time (`2023-07-04T12:00:00`).
    pub at: Option<NaiveDateTime>,
    /// What-if charging amperage for the Model 3. Providing either amp
    /// parameter switches the forecast into override mode; the missing one is
    /// treated as 0 (not charging).
    pub model3_amps: Option<u32>,
    /// What-if charging amperage for the Model X.
    pub modelx_amps: Option<u32>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
