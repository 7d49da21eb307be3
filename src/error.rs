//! Error types for Moodlens
//!
//! All errors implement `IntoResponse` for Axum handlers. Only validation
//! and hard configuration problems reach the HTTP boundary as errors;
//! provider flakiness is absorbed by the analysis orchestrator.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::analysis::request::ValidationError;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Provider credential rejected: {0}")]
    ProviderAuth(String),

    #[error("Provider rate limited: {0}")]
    RateLimited(String),

    #[error("No usable model in the configured pool: {0}")]
    NoUsableModel(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::ProviderAuth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            Self::NoUsableModel(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::ConfigFileRead { .. } | Self::ConfigParseFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
