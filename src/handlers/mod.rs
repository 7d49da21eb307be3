//! HTTP request handlers for the Moodlens API

use crate::analysis::backoff::BackoffPolicy;
use crate::analysis::orchestrator::Orchestrator;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::provider::{GeminiInvoker, ModelInvoker};
use std::sync::Arc;
use std::time::Duration;

pub mod analyze;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Contains configuration, the long-lived orchestrator (which owns the
/// process-wide rotation pointer), and metrics. All fields are Arc'd for
/// cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create AppState from configuration, reading the provider API key
    /// from the configured environment variable
    pub fn new(config: Config) -> AppResult<Self> {
        let preset = config.active_preset();
        let invoker = Arc::new(GeminiInvoker::from_config(
            &config.provider,
            preset.attempt_timeout(),
        )?);
        Self::with_invoker(config, invoker)
    }

    /// Create AppState with an explicit invoker
    ///
    /// Used by tests to drive the full HTTP surface with scripted or
    /// mock-server invokers instead of live provider credentials.
    pub fn with_invoker(config: Config, invoker: Arc<dyn ModelInvoker>) -> AppResult<Self> {
        let metrics = Arc::new(
            Metrics::new().map_err(|e| AppError::Internal(format!("metrics registry: {e}")))?,
        );

        let preset = config.active_preset();
        let orchestrator = Arc::new(Orchestrator::new(
            invoker,
            preset.models().to_vec(),
            preset.max_retries(),
            BackoffPolicy::from(&config.backoff),
            metrics.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the orchestrator
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The hard end-to-end ceiling for one analyze request
    pub fn request_ceiling(&self) -> Duration {
        Duration::from_secs(self.config.server.request_ceiling_seconds)
    }
}
