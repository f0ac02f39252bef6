//! REST API for the dashboard.
//!
//! Provides two GET endpoints:
//! - `/status` — current-conditions snapshot from the feed
//! - `/forecast` — end-of-day battery forecast, with optional what-if
//!   charging amperages

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::config::DashboardConfig;
use crate::feed::TelemetrySample;

/// Immutable application state shared across all request handlers.
///
/// Constructed once from the loaded feed and wrapped in `Arc` — no locks
/// needed since all data is read-only.
pub struct AppState {
    /// Dashboard configuration.
    pub config: DashboardConfig,
    /// Telemetry feed, sorted ascending by timestamp.
    pub samples: Vec<TelemetrySample>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/forecast", get(handlers::get_forecast))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
