//! Upstream LLM provider abstraction
//!
//! The provider is an opaque remote generate-content function. The
//! [`ModelInvoker`] trait allows dependency injection of scripted
//! invokers in tests, so the orchestrator's retry policy is testable
//! without any network. Failures are a typed taxonomy the orchestrator
//! pattern-matches on to choose its backoff, not exceptions.

pub mod gemini;

pub use gemini::GeminiInvoker;

use async_trait::async_trait;
use thiserror::Error;

/// Classified failure of a single provider invocation
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The call did not settle within the attempt timeout. The late
    /// response, if any, is ignored.
    #[error("request to model {model} timed out after {timeout_seconds}s")]
    Timeout { model: String, timeout_seconds: u64 },

    /// 429 / RESOURCE_EXHAUSTED / quota-or-rate-limit phrasing
    #[error("provider rate limited: {message}")]
    RateLimited { message: String },

    /// 401/403: the shared credential was rejected
    #[error("provider rejected credentials: {message}")]
    Auth { message: String },

    /// 404 or "no such model"
    #[error("model {model} not found")]
    NotFound { model: String },

    /// Anything else: network failures, 5xx, empty responses
    #[error("provider unavailable: {message}")]
    Transient { message: String },
}

impl ProviderError {
    /// Stable label for logs and metrics
    pub fn kind_label(&self) -> &'static str {
        match self {
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::Auth { .. } => "auth",
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Transient { .. } => "transient",
        }
    }
}

/// A single generate-content call against one model identifier
///
/// Implementations own their sampling configuration and attempt timeout;
/// the orchestrator only chooses which model to ask and what to do with
/// the outcome.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Generate text for `prompt` using `model`
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}
