//! Prometheus metrics endpoint
//!
//! Serves the metrics registry in Prometheus text exposition format.

use crate::handlers::AppState;
use axum::{extract::State, http::StatusCode};

/// GET /metrics handler
///
/// Rendering failures return 500 with a plain message; they indicate a
/// programming bug (encoder failure), never a request problem.
pub async fn handler(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    state.metrics().render().map_err(|e| {
        tracing::error!(error = %e, "Failed to render metrics");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to render metrics: {e}"),
        )
    })
}
