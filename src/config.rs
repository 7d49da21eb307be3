//! Configuration management for Moodlens
//!
//! Parses TOML configuration files and provides typed access to settings.
//! The "stable" and "extended" analysis variants are configuration presets
//! over a single orchestrator, not separate code paths.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
    pub presets: PresetsConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Hard end-to-end ceiling on a single analyze request. If the retry
    /// loop would run past this, the handler answers with the fallback
    /// analysis instead of timing the whole request out.
    #[serde(default = "default_request_ceiling")]
    pub request_ceiling_seconds: u64,
}

fn default_request_ceiling() -> u64 {
    30
}

/// Upstream LLM provider configuration
///
/// The provider is an opaque remote generate-content call. The API key is
/// never stored in the config file; only the name of the environment
/// variable that carries it is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_max_output_tokens() -> u32 {
    800
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

/// Which preset the analyze endpoint runs with
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub preset: PresetName,
}

/// Named orchestrator presets
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    #[default]
    Stable,
    Extended,
}

impl std::fmt::Display for PresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresetName::Stable => write!(f, "stable"),
            PresetName::Extended => write!(f, "extended"),
        }
    }
}

/// The two shipped orchestrator presets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetsConfig {
    pub stable: PresetConfig,
    pub extended: PresetConfig,
}

/// A single orchestrator parameterization: model pool, attempt budget,
/// per-attempt timeout
///
/// Fields are private to enforce invariants. Configuration is loaded via
/// deserialization and validated via Config::validate(). After construction,
/// fields cannot be mutated, ensuring validated data remains valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetConfig {
    /// Ordered pool of model identifiers tried round-robin
    models: Vec<String>,
    /// Maximum attempts per request, at least the pool size
    max_retries: usize,
    /// Wall-clock timeout for a single provider call
    attempt_timeout_seconds: u64,
}

impl PresetConfig {
    /// Get the ordered model pool
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Get the per-request attempt budget
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Get the per-attempt timeout
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_seconds)
    }
}

/// Retry delay tuning table
///
/// These are behavioral-compatibility constants, not values derived from
/// any invariant. They are configuration so the two ladders can be tuned
/// without touching orchestrator code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackoffConfig {
    /// Base delay after a rate-limit failure; doubles per consecutive
    /// rate-limit failure up to `rate_limit_cap_ms`
    #[serde(default = "default_rate_limit_base_ms")]
    pub rate_limit_base_ms: u64,
    #[serde(default = "default_rate_limit_cap_ms")]
    pub rate_limit_cap_ms: u64,
    /// Fixed delay after a parse/schema failure
    #[serde(default = "default_parse_retry_ms")]
    pub parse_retry_ms: u64,
    /// Base delay for other transient failures; grows linearly with the
    /// attempt number up to `transient_cap_ms`
    #[serde(default = "default_transient_base_ms")]
    pub transient_base_ms: u64,
    #[serde(default = "default_transient_cap_ms")]
    pub transient_cap_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            rate_limit_base_ms: default_rate_limit_base_ms(),
            rate_limit_cap_ms: default_rate_limit_cap_ms(),
            parse_retry_ms: default_parse_retry_ms(),
            transient_base_ms: default_transient_base_ms(),
            transient_cap_ms: default_transient_cap_ms(),
        }
    }
}

fn default_rate_limit_base_ms() -> u64 {
    2000
}

fn default_rate_limit_cap_ms() -> u64 {
    15000
}

fn default_parse_retry_ms() -> u64 {
    300
}

fn default_transient_base_ms() -> u64 {
    1000
}

fn default_transient_cap_ms() -> u64 {
    5000
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source: Box::new(source),
            }
        })?;

        // Phase 3: Validate parsed config
        config.validate().map_err(|e| {
            crate::error::AppError::Config(format!("{}: {}", path_display, e))
        })?;

        Ok(config)
    }

    /// Get the preset the analyze endpoint is configured to run with
    pub fn active_preset(&self) -> &PresetConfig {
        match self.analysis.preset {
            PresetName::Stable => &self.presets.stable,
            PresetName::Extended => &self.presets.extended,
        }
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()`, but can also be called
    /// explicitly when constructing Config via other means (e.g., in tests).
    pub fn validate(&self) -> crate::error::AppResult<()> {
        // Preset validation across both presets
        for (preset_name, preset) in [
            ("stable", &self.presets.stable),
            ("extended", &self.presets.extended),
        ] {
            if preset.models.is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "presets.{} has an empty model pool. \
                    List at least one model identifier in presets.{}.models.",
                    preset_name, preset_name
                )));
            }

            for model in &preset.models {
                if model.trim().is_empty() {
                    return Err(crate::error::AppError::Config(format!(
                        "presets.{} contains an empty model identifier",
                        preset_name
                    )));
                }
            }

            // The budget must allow trying every pool member at least once
            if preset.max_retries < preset.models.len() {
                return Err(crate::error::AppError::Config(format!(
                    "presets.{}.max_retries ({}) is smaller than the model pool ({}). \
                    Every model must get at least one attempt before the fallback is served.",
                    preset_name,
                    preset.max_retries,
                    preset.models.len()
                )));
            }

            if preset.attempt_timeout_seconds == 0 {
                return Err(crate::error::AppError::Config(format!(
                    "presets.{}.attempt_timeout_seconds must be greater than 0",
                    preset_name
                )));
            }
            if preset.attempt_timeout_seconds > 300 {
                return Err(crate::error::AppError::Config(format!(
                    "presets.{}.attempt_timeout_seconds cannot exceed 300 seconds, got {}",
                    preset_name, preset.attempt_timeout_seconds
                )));
            }
        }

        // Provider validation
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(crate::error::AppError::Config(format!(
                "provider.base_url '{}' must start with 'http://' or 'https://'",
                self.provider.base_url
            )));
        }

        if self.provider.api_key_env.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "provider.api_key_env must name the environment variable carrying the API key"
                    .to_string(),
            ));
        }

        if self.provider.max_output_tokens == 0 {
            return Err(crate::error::AppError::Config(
                "provider.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.provider.temperature < 0.0
            || self.provider.temperature > 2.0
            || !self.provider.temperature.is_finite()
        {
            return Err(crate::error::AppError::Config(format!(
                "provider.temperature must be a finite number between 0.0 and 2.0, got {}",
                self.provider.temperature
            )));
        }

        if self.provider.top_p <= 0.0 || self.provider.top_p > 1.0 || !self.provider.top_p.is_finite()
        {
            return Err(crate::error::AppError::Config(format!(
                "provider.top_p must be within (0.0, 1.0], got {}",
                self.provider.top_p
            )));
        }

        // Backoff validation: every delay positive, caps at or above bases
        if self.backoff.rate_limit_base_ms == 0
            || self.backoff.parse_retry_ms == 0
            || self.backoff.transient_base_ms == 0
        {
            return Err(crate::error::AppError::Config(
                "backoff delays must be greater than 0".to_string(),
            ));
        }
        if self.backoff.rate_limit_cap_ms < self.backoff.rate_limit_base_ms {
            return Err(crate::error::AppError::Config(format!(
                "backoff.rate_limit_cap_ms ({}) is below backoff.rate_limit_base_ms ({})",
                self.backoff.rate_limit_cap_ms, self.backoff.rate_limit_base_ms
            )));
        }
        if self.backoff.transient_cap_ms < self.backoff.transient_base_ms {
            return Err(crate::error::AppError::Config(format!(
                "backoff.transient_cap_ms ({}) is below backoff.transient_base_ms ({})",
                self.backoff.transient_cap_ms, self.backoff.transient_base_ms
            )));
        }

        // Request ceiling validation
        if self.server.request_ceiling_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "server.request_ceiling_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_ceiling_seconds > 300 {
            return Err(crate::error::AppError::Config(format!(
                "server.request_ceiling_seconds cannot exceed 300 seconds, got {}",
                self.server.request_ceiling_seconds
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source: Box::new(source),
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}
