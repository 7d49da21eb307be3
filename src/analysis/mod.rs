//! Analysis request orchestration core
//!
//! Turns a validated journal entry into a schema-conformant
//! [`types::AnalysisResult`] despite an unreliable upstream model:
//! validation → prompt building → {invoke → sanitize → schema-validate}
//! looped by the orchestrator → post-processing into a journal entry.

pub mod backoff;
pub mod fallback;
pub mod orchestrator;
pub mod postprocess;
pub mod prompt;
pub mod request;
pub mod sanitize;
pub mod schema;
pub mod types;
