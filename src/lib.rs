//! Moodlens - journaling analysis gateway
//!
//! Accepts free-text mood entries over HTTP, orchestrates analysis requests
//! against a pool of hosted LLM identifiers, and returns a validated,
//! schema-conformant emotional analysis that degrades to a safe fallback
//! when the upstream model cannot be relied on.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod provider;
pub mod telemetry;
