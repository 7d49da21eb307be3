//! Structured logging setup
//!
//! Tracing is initialized once at startup; every later call is a no-op so
//! tests and embedded callers can invoke it freely.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// The directive string used when `RUST_LOG` is not set
///
/// The configured level applies to this crate only; tower-http access
/// logging stays at debug so request traces are always available.
fn default_directives(level: &str) -> String {
    format!("moodlens={level},tower_http=debug")
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when present; otherwise the level from the
/// observability config section is used.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
