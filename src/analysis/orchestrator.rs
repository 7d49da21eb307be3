//! Retry / fallback orchestration over the model pool
//!
//! The state machine is `Attempting(n) → {Success, Attempting(n+1),
//! ExhaustedFallback}`. A single request walks the pool round-robin from
//! the process-wide rotation pointer, never repeating a model while an
//! untried one remains, classifies each failure to pick a backoff delay,
//! and serves the constant fallback analysis once the attempt budget is
//! spent. Provider flakiness never reaches the caller as an error; only
//! credential rejection and an all-models-missing pool do, because no
//! amount of retrying fixes a deployment problem.

use crate::analysis::backoff::BackoffPolicy;
use crate::analysis::fallback::fallback_analysis;
use crate::analysis::sanitize::{self, ParseError};
use crate::analysis::schema::{self, SchemaError};
use crate::analysis::types::AnalysisResult;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::provider::{ModelInvoker, ProviderError};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Process-wide rotation pointer distributing first model choices
/// round-robin across requests
///
/// Shared by concurrent requests without a lock. Two requests may read
/// the same starting index and begin with the same model; that costs
/// fairness, not correctness, so the weak consistency is accepted rather
/// than locked away. The pointer has no correctness dependency at all.
#[derive(Debug, Default)]
pub struct RotationState {
    pointer: AtomicUsize,
}

impl RotationState {
    pub fn new() -> Self {
        Self {
            pointer: AtomicUsize::new(0),
        }
    }

    /// The index the next request should start its round-robin walk from
    pub fn next(&self) -> usize {
        self.pointer.load(Ordering::Relaxed)
    }

    /// Move the pointer past `index` so future requests start at the
    /// following pool member
    pub fn advance_past(&self, index: usize, pool_len: usize) {
        self.pointer.store((index + 1) % pool_len, Ordering::Relaxed);
    }
}

/// Why one attempt failed. Invocation, parsing, and schema validation
/// are all caught at this granularity; partial success is not possible.
#[derive(Debug, Error)]
enum AttemptFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("output parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("output schema invalid: {0}")]
    Schema(#[from] SchemaError),
}

impl AttemptFailure {
    fn kind_label(&self) -> &'static str {
        match self {
            AttemptFailure::Provider(err) => err.kind_label(),
            AttemptFailure::Parse(_) => "parse",
            AttemptFailure::Schema(_) => "schema",
        }
    }
}

/// The retry/fallback orchestrator
///
/// One long-lived instance per configured preset; the rotation pointer it
/// owns persists across requests. `run` is the only entry point.
pub struct Orchestrator {
    invoker: Arc<dyn ModelInvoker>,
    pool: Vec<String>,
    max_retries: usize,
    backoff: BackoffPolicy,
    rotation: RotationState,
    metrics: Arc<Metrics>,
}

impl Orchestrator {
    /// Create an orchestrator over an ordered model pool
    ///
    /// The pool and budget come from a validated preset: the pool is
    /// non-empty and `max_retries` is at least the pool size, so every
    /// model gets a chance before the fallback is served.
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        pool: Vec<String>,
        max_retries: usize,
        backoff: BackoffPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        debug_assert!(!pool.is_empty());
        debug_assert!(max_retries >= pool.len());

        Self {
            invoker,
            pool,
            max_retries,
            backoff,
            rotation: RotationState::new(),
            metrics,
        }
    }

    /// Produce an analysis for the prompt, whatever the provider does
    ///
    /// Walks the pool with per-attempt backoff and answers with the
    /// constant fallback once the budget is exhausted. The only errors
    /// this returns are deployment problems: `ProviderAuth` when the
    /// shared credential is rejected (another model cannot succeed with
    /// the same key) and `NoUsableModel` when every pool member reported
    /// not-found.
    pub async fn run(&self, prompt: &str) -> AppResult<AnalysisResult> {
        let mut tried: HashSet<usize> = HashSet::new();
        let mut missing_models: HashSet<usize> = HashSet::new();
        let mut consecutive_rate_limits: u32 = 0;

        for attempt in 1..=self.max_retries {
            let index = self.select_model_index(attempt, &tried);
            let model = &self.pool[index];
            tried.insert(index);

            tracing::debug!(
                model = %model,
                attempt = attempt,
                max_retries = self.max_retries,
                "trying model"
            );

            let started = std::time::Instant::now();
            let outcome = self.try_model(model, prompt).await;
            self.metrics
                .observe_attempt_duration(model, started.elapsed().as_secs_f64());

            match outcome {
                Ok(result) => {
                    self.rotation.advance_past(index, self.pool.len());
                    self.metrics.record_attempt("success");
                    tracing::info!(
                        model = %model,
                        attempt = attempt,
                        "analysis succeeded"
                    );
                    return Ok(result);
                }
                Err(failure) => {
                    self.metrics.record_attempt(failure.kind_label());
                    tracing::warn!(
                        model = %model,
                        attempt = attempt,
                        max_retries = self.max_retries,
                        error = %failure,
                        "analysis attempt failed"
                    );

                    if let AttemptFailure::Provider(ProviderError::Auth { message }) = &failure {
                        return Err(AppError::ProviderAuth(message.clone()));
                    }

                    if matches!(
                        failure,
                        AttemptFailure::Provider(ProviderError::NotFound { .. })
                    ) {
                        missing_models.insert(index);
                        if missing_models.len() == self.pool.len() {
                            return Err(AppError::NoUsableModel(format!(
                                "all {} configured models returned not-found",
                                self.pool.len()
                            )));
                        }
                    }

                    if matches!(
                        failure,
                        AttemptFailure::Provider(ProviderError::RateLimited { .. })
                    ) {
                        consecutive_rate_limits += 1;
                    } else {
                        consecutive_rate_limits = 0;
                    }

                    if attempt == self.max_retries {
                        break;
                    }

                    let delay = self.delay_for(&failure, attempt, consecutive_rate_limits);
                    tracing::debug!(
                        delay_ms = delay.as_millis() as u64,
                        failure_kind = failure.kind_label(),
                        "backing off before next attempt"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        tracing::error!(
            attempts = self.max_retries,
            "all analysis attempts failed, serving fallback"
        );
        self.metrics.record_fallback();
        Ok(fallback_analysis())
    }

    /// One attempt: invoke, repair-parse, schema-validate
    async fn try_model(&self, model: &str, prompt: &str) -> Result<AnalysisResult, AttemptFailure> {
        let raw = self.invoker.generate(model, prompt).await?;

        tracing::debug!(
            model = %model,
            preview = %preview(&raw),
            "raw model output"
        );

        let value = sanitize::parse(&raw)?;
        Ok(schema::validate_analysis(value)?)
    }

    /// Round-robin selection from the shared rotation pointer, skipping
    /// indices already tried this request while any untried index remains
    ///
    /// Once every model has been tried, the extra budget keeps cycling,
    /// which also guarantees consecutive attempts hit different models for
    /// pools of size two or more.
    fn select_model_index(&self, attempt: usize, tried: &HashSet<usize>) -> usize {
        let pool_len = self.pool.len();
        let start = self.rotation.next() % pool_len;
        let candidate = (start + attempt - 1) % pool_len;

        if tried.len() >= pool_len || !tried.contains(&candidate) {
            return candidate;
        }

        (0..pool_len)
            .map(|offset| (candidate + offset) % pool_len)
            .find(|index| !tried.contains(index))
            .unwrap_or(candidate)
    }

    fn delay_for(
        &self,
        failure: &AttemptFailure,
        attempt: usize,
        consecutive_rate_limits: u32,
    ) -> std::time::Duration {
        match failure {
            AttemptFailure::Provider(ProviderError::RateLimited { .. }) => {
                self.backoff.rate_limit_delay(consecutive_rate_limits)
            }
            AttemptFailure::Parse(_) | AttemptFailure::Schema(_) => self.backoff.parse_delay(),
            AttemptFailure::Provider(_) => self.backoff.transient_delay(attempt),
        }
    }
}

/// First 500 characters of model output, for debug logs
fn preview(raw: &str) -> String {
    raw.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Invoker that replays a fixed script of outcomes and records which
    /// models were asked, in order
    struct ScriptedInvoker {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for ScriptedInvoker {
        async fn generate(&self, model: &str, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| transient("script exhausted"))
        }
    }

    fn transient(message: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Transient {
            message: message.to_string(),
        })
    }

    fn rate_limited() -> Result<String, ProviderError> {
        Err(ProviderError::RateLimited {
            message: "quota exceeded".to_string(),
        })
    }

    fn not_found(model: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotFound {
            model: model.to_string(),
        })
    }

    fn valid_response() -> Result<String, ProviderError> {
        Ok(serde_json::to_string(&fallback_analysis()).unwrap())
    }

    fn orchestrator(
        invoker: Arc<ScriptedInvoker>,
        pool: &[&str],
        max_retries: usize,
    ) -> Orchestrator {
        Orchestrator::new(
            invoker,
            pool.iter().map(|m| m.to_string()).collect(),
            max_retries,
            BackoffPolicy::default(),
            Arc::new(Metrics::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![valid_response()]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("should succeed");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls(), vec!["model-a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_transient_then_success() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            transient("503 overloaded"),
            valid_response(),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("should succeed");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls(), vec!["model-a", "model-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_serves_exact_fallback() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            transient("boom"),
            transient("boom"),
            transient("boom"),
            transient("boom"),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("never fails on flakiness");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_output_counts_as_failure() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok("complete nonsense, not json".to_string()),
            valid_response(),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("should succeed");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_invalid_output_counts_as_failure() {
        // Valid JSON, wrong shape
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(r#"{"emotions": []}"#.to_string()),
            valid_response(),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("should succeed");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_repeats_model_while_untried_remain() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            transient("boom"),
            transient("boom"),
            transient("boom"),
            transient("boom"),
            transient("boom"),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b", "model-c"], 5);

        let _ = orch.run("prompt").await;
        let calls = invoker.calls();

        // First three attempts cover the whole pool with no repeats
        let first_cycle: HashSet<&String> = calls.iter().take(3).collect();
        assert_eq!(first_cycle.len(), 3);

        // And no two consecutive attempts ever hit the same model
        for pair in calls.windows(2) {
            assert_ne!(pair[0], pair[1], "same model tried twice in a row");
        }
    }

    #[tokio::test]
    async fn test_rotation_advances_past_successful_model() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![valid_response(), valid_response()]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        orch.run("prompt").await.expect("first request");
        orch.run("prompt").await.expect("second request");

        // Second request starts after the model the first one used
        assert_eq!(invoker.calls(), vec!["model-a", "model-b"]);
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_immediately() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![Err(ProviderError::Auth {
            message: "API key not valid".to_string(),
        })]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let err = orch.run("prompt").await.unwrap_err();
        assert!(matches!(err, AppError::ProviderAuth(_)));
        assert_eq!(invoker.calls().len(), 1, "credential failures are not retried");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_model_missing_surfaces_no_usable_model() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            not_found("model-a"),
            not_found("model-b"),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let err = orch.run("prompt").await.unwrap_err();
        assert!(matches!(err, AppError::NoUsableModel(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_missing_model_does_not_doom_the_pool() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            not_found("model-a"),
            valid_response(),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("should succeed");
        assert_eq!(result, fallback_analysis());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_storm_still_ends_in_fallback() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
        ]));
        let orch = orchestrator(invoker.clone(), &["model-a", "model-b"], 4);

        let result = orch.run("prompt").await.expect("rate limits are absorbed");
        assert_eq!(result, fallback_analysis());
        assert_eq!(invoker.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_counted_in_metrics() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![transient("boom"), transient("boom")]));
        let metrics = Arc::new(Metrics::new().unwrap());
        let orch = Orchestrator::new(
            invoker,
            vec!["model-a".to_string(), "model-b".to_string()],
            2,
            BackoffPolicy::default(),
            metrics.clone(),
        );

        let _ = orch.run("prompt").await;
        assert_eq!(metrics.fallback_served_count(), 1);
    }

    #[test]
    fn test_rotation_state_wraps() {
        let rotation = RotationState::new();
        assert_eq!(rotation.next(), 0);
        rotation.advance_past(1, 2);
        assert_eq!(rotation.next(), 0);
        rotation.advance_past(0, 2);
        assert_eq!(rotation.next(), 1);
    }
}
