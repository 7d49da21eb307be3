//! Integration tests for configuration file loading
//!
//! Exercises the three loading phases (read, parse, validate) against
//! real files on disk.

use moodlens::config::Config;
use moodlens::error::AppError;
use std::io::Write;
use tempfile::NamedTempFile;

const VALID_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000

[provider]
api_key_env = "GOOGLE_API_KEY"

[analysis]
preset = "extended"

[presets.stable]
models = ["gemini-2.0-flash-lite", "gemini-2.0-flash"]
max_retries = 4
attempt_timeout_seconds = 20

[presets.extended]
models = ["gemini-2.0-flash-lite", "gemini-2.0-flash", "gemini-2.5-flash"]
max_retries = 5
attempt_timeout_seconds = 25
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(contents.as_bytes()).expect("should write");
    file
}

#[test]
fn test_valid_file_loads() {
    let file = write_config(VALID_CONFIG);
    let config = Config::from_file(file.path()).expect("should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.active_preset().models().len(), 3);
    // Omitted sections take their defaults
    assert_eq!(config.backoff.parse_retry_ms, 300);
    assert_eq!(config.observability.log_level, "info");
    assert_eq!(config.server.request_ceiling_seconds, 30);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = Config::from_file("/definitely/not/a/real/path.toml").unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = write_config("this is not toml [[[");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_invalid_values_are_validation_errors() {
    let broken = VALID_CONFIG.replace("max_retries = 4", "max_retries = 0");
    let file = write_config(&broken);
    let err = Config::from_file(file.path()).unwrap_err();
    match err {
        AppError::Config(message) => assert!(message.contains("max_retries")),
        other => panic!("expected Config error, got {other:?}"),
    }
}
