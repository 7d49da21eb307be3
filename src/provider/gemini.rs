//! Provider client for the hosted generateContent API
//!
//! Issues one generation call per invocation with fixed sampling
//! parameters, races it against a wall-clock timeout, and classifies
//! provider failures into the [`ProviderError`] taxonomy. A timeout
//! cancels the in-flight request; a late response is never observed.

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::provider::{ModelInvoker, ProviderError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// reqwest-backed invoker for the generateContent endpoint
pub struct GeminiInvoker {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f64,
    max_output_tokens: u32,
    top_p: f64,
    top_k: u32,
    attempt_timeout: Duration,
}

impl GeminiInvoker {
    /// Create an invoker with an explicit API key
    pub fn new(
        config: &ProviderConfig,
        api_key: String,
        attempt_timeout: Duration,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
            attempt_timeout,
        })
    }

    /// Create an invoker reading the API key from the environment variable
    /// named in the provider configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::ProviderAuth` if the variable is unset or empty;
    /// a missing credential is an operator problem surfaced at startup,
    /// not at first request.
    pub fn from_config(config: &ProviderConfig, attempt_timeout: Duration) -> AppResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ProviderAuth(format!(
                    "environment variable {} is not set; it must carry the provider API key",
                    config.api_key_env
                ))
            })?;

        Self::new(config, api_key, attempt_timeout)
    }

    async fn generate_inner(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
                "topP": self.top_p,
                "topK": self.top_k,
            },
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transient {
                message: format!("request to {model} failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &message, model));
        }

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::Transient {
                    message: format!("malformed provider response from {model}: {e}"),
                })?;

        let text = parsed.text();
        if text.is_empty() {
            return Err(ProviderError::Transient {
                message: format!("model {model} returned an empty response"),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl ModelInvoker for GeminiInvoker {
    /// Race the generation call against the attempt timeout; whichever
    /// settles first wins
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.attempt_timeout, self.generate_inner(model, prompt)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                model: model.to_string(),
                timeout_seconds: self.attempt_timeout.as_secs(),
            }),
        }
    }
}

/// Classify a non-success provider response
///
/// Order matters: rate-limit phrasing wins over the status family so that
/// 403-with-quota-message bodies are retried against a different model
/// rather than treated as credential failures.
fn classify_failure(status: StatusCode, message: &str, model: &str) -> ProviderError {
    let lower = message.to_lowercase();

    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests");
    if rate_limited {
        return ProviderError::RateLimited {
            message: truncate(message, 200),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ProviderError::Auth {
            message: truncate(message, 200),
        };
    }

    if status == StatusCode::NOT_FOUND || lower.contains("no such model") {
        return ProviderError::NotFound {
            model: model.to_string(),
        };
    }

    ProviderError::Transient {
        message: format!("{status}: {}", truncate(message, 200)),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Wire shape of a generateContent response, reduced to what we read
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
