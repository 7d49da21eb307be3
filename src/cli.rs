//! Command-line interface for Moodlens
//!
//! Provides argument parsing and subcommand handling for the Moodlens binary.

use clap::{Parser, Subcommand};

/// Journaling analysis gateway
#[derive(Parser)]
#[command(name = "moodlens")]
#[command(version)]
#[command(about = "Journaling analysis gateway")]
#[command(
    long_about = "Moodlens turns free-text mood entries into structured emotional analyses \
    by orchestrating a pool of hosted LLM identifiers with retry, backoff, and a safe \
    fallback when the upstream model cannot be relied on."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Moodlens Configuration
# ======================
#
# This file configures the HTTP server, the upstream LLM provider, the
# analysis orchestrator presets, the retry backoff table, and observability.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Hard end-to-end ceiling for one analyze request, in seconds. If the retry
# loop would run past this, the request is answered with the safe fallback
# analysis instead of timing out.
request_ceiling_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDER
# ─────────────────────────────────────────────────────────────────────────────
#
# The upstream model host. The API key itself is never written here; only
# the name of the environment variable that carries it is.

[provider]
base_url = "https://generativelanguage.googleapis.com"
api_key_env = "GOOGLE_API_KEY"
max_output_tokens = 800
temperature = 0.7
top_p = 0.95
top_k = 40

# ─────────────────────────────────────────────────────────────────────────────
# ANALYSIS PRESETS
# ─────────────────────────────────────────────────────────────────────────────
#
# Each preset parameterizes the same orchestrator: an ordered model pool
# tried round-robin, an attempt budget, and a per-attempt timeout. The
# budget must be at least the pool size so every model gets one attempt
# before the fallback is served.

[analysis]
# Which preset the analyze endpoint runs with: "stable" or "extended"
preset = "stable"

[presets.stable]
models = ["gemini-2.0-flash-lite", "gemini-2.0-flash"]
max_retries = 4
attempt_timeout_seconds = 20

[presets.extended]
models = ["gemini-2.0-flash-lite", "gemini-2.0-flash", "gemini-2.5-flash"]
max_retries = 5
attempt_timeout_seconds = 25

# ─────────────────────────────────────────────────────────────────────────────
# BACKOFF (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Retry delay tuning. Rate-limit failures double from the base up to the
# cap across consecutive rate-limit failures; parse failures wait a fixed
# short delay; other transient failures grow linearly with the attempt
# number up to the cap.

[backoff]
rate_limit_base_ms = 2000
rate_limit_cap_ms = 15000
parse_retry_ms = 300
transient_base_ms = 1000
transient_cap_ms = 5000

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
# For production, consider using a reverse proxy to restrict access
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        // Clap's built-in verification for the CLI structure
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["moodlens"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["moodlens", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["moodlens", "config"]);
        assert!(matches!(cli.command, Some(Command::Config { output: None })));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["moodlens", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_valid_toml() {
        let template = generate_config_template();
        let result: Result<toml::Value, _> = toml::from_str(template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_parses_as_valid_config() {
        // The template must pass full config validation, not just TOML parsing
        let config = crate::config::Config::from_str(generate_config_template())
            .expect("template should be a valid Config");
        assert_eq!(config.active_preset().models().len(), 2);
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[provider]"));
        assert!(template.contains("[analysis]"));
        assert!(template.contains("[presets.stable]"));
        assert!(template.contains("[presets.extended]"));
        assert!(template.contains("[backoff]"));
        assert!(template.contains("[observability]"));
    }
}
