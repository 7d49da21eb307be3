//! Analyze endpoint handler
//!
//! Handles POST /analyze: validate the entry, build the prompt, let the
//! orchestrator produce an analysis, post-process it into a journal
//! entry, and return `{id, entry}`. The caller owns persistence.

use crate::analysis::fallback::fallback_analysis;
use crate::analysis::postprocess;
use crate::analysis::prompt;
use crate::analysis::request::{AnalysisRequest, RawAnalysisRequest};
use crate::analysis::types::JournalEntry;
use crate::error::AppError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;
use uuid::Uuid;

/// Analyze response to client: the entry id and the full entry
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub id: Uuid,
    pub entry: JournalEntry,
}

/// POST /analyze handler
///
/// Worst-case latency is bounded twice: each model attempt by the preset's
/// attempt timeout, and the whole request by the configured ceiling. If
/// the ceiling fires while the orchestrator is still retrying, the user
/// still gets the safe fallback analysis rather than an error. The only
/// error responses out of this handler are invalid input and hard
/// deployment problems (credentials, empty-of-models pool).
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(raw): Json<RawAnalysisRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.metrics().record_request();

    tracing::debug!(
        request_id = %request_id,
        text_chars = raw.text.chars().count(),
        "Received analyze request"
    );

    let request = AnalysisRequest::validate(raw)?;
    let prompt = prompt::build_prompt(&request);

    tracing::debug!(
        request_id = %request_id,
        prompt_chars = prompt.chars().count(),
        "Built analysis prompt"
    );

    let analysis = match tokio::time::timeout(
        state.request_ceiling(),
        state.orchestrator().run(&prompt),
    )
    .await
    {
        Ok(outcome) => outcome?,
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                ceiling_seconds = state.request_ceiling().as_secs(),
                "Analysis exceeded the request ceiling, serving fallback"
            );
            state.metrics().record_fallback();
            fallback_analysis()
        }
    };

    let entry = postprocess::finalize(analysis, &request);

    tracing::info!(
        request_id = %request_id,
        entry_id = %entry.id,
        risk_level = ?entry.analysis.risk_level,
        emotions = entry.analysis.emotions.len(),
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse {
        id: entry.id,
        entry,
    }))
}
