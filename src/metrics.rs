//! Prometheus metrics collection for Moodlens
//!
//! Tracks analyze request volume, per-attempt outcomes by failure kind,
//! fallback servings, and attempt latency per model. Exposed via the
//! `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for the analysis gateway
///
/// Observability must never break requests: recording errors are logged
/// and swallowed by callers, not propagated.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    analyze_requests: IntCounter,
    attempts_total: IntCounterVec,
    fallback_served: IntCounter,
    attempt_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let analyze_requests = IntCounter::with_opts(Opts::new(
            "moodlens_analyze_requests_total",
            "Total number of analyze requests received",
        ))?;

        // Cardinality: one series per attempt outcome
        // (success, timeout, rate_limited, auth, not_found, transient, parse, schema)
        let attempts_total = IntCounterVec::new(
            Opts::new(
                "moodlens_analysis_attempts_total",
                "Model attempts by outcome",
            ),
            &["outcome"],
        )?;

        let fallback_served = IntCounter::with_opts(Opts::new(
            "moodlens_fallback_served_total",
            "Analyses answered with the safe fallback result",
        ))?;

        // Buckets sized for LLM latency: sub-second to the attempt timeout
        let attempt_duration = HistogramVec::new(
            HistogramOpts::new(
                "moodlens_attempt_duration_seconds",
                "Wall-clock duration of a single model attempt",
            )
            .buckets(vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 25.0]),
            &["model"],
        )?;

        registry.register(Box::new(analyze_requests.clone()))?;
        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(fallback_served.clone()))?;
        registry.register(Box::new(attempt_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            analyze_requests,
            attempts_total,
            fallback_served,
            attempt_duration,
        })
    }

    /// Count one inbound analyze request
    pub fn record_request(&self) {
        self.analyze_requests.inc();
    }

    /// Count one model attempt with its outcome label
    pub fn record_attempt(&self, outcome: &str) {
        self.attempts_total.with_label_values(&[outcome]).inc();
    }

    /// Count one fallback serving
    pub fn record_fallback(&self) {
        self.fallback_served.inc();
    }

    /// Observe the wall-clock duration of one model attempt
    pub fn observe_attempt_duration(&self, model: &str, seconds: f64) {
        self.attempt_duration
            .with_label_values(&[model])
            .observe(seconds);
    }

    /// Number of fallback servings so far (used by tests and health checks)
    pub fn fallback_served_count(&self) -> u64 {
        self.fallback_served.get()
    }

    /// Render the registry in Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
