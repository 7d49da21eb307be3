//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Active orchestrator preset name
    pub preset: String,
    /// Number of models in the active pool
    pub pool_size: usize,
}

/// Health check handler
///
/// Returns 200 OK with the active preset and its pool size, which is
/// enough for a load balancer probe and a quick config sanity check.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            preset: state.config().analysis.preset.to_string(),
            pool_size: state.config().active_preset().models().len(),
        }),
    )
}
