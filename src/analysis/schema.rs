//! Output schema validation for model responses
//!
//! Two-phase pipeline: the sanitizer produces an untyped `serde_json::Value`;
//! this module is the only place that turns it into a typed
//! [`AnalysisResult`]. Typed data does not exist anywhere until validation
//! succeeds. Any violation is a single attempt failure to the orchestrator,
//! which treats it exactly like a provider failure.

use crate::analysis::types::{AnalysisResult, EmotionLabel, RiskLevel};
use std::collections::HashSet;
use thiserror::Error;

/// Bounds of the output contract
const MIN_EMOTIONS: usize = 1;
const MAX_EMOTIONS: usize = 5;
const SUMMARY_MIN_CHARS: usize = 10;
const SUMMARY_MAX_CHARS: usize = 500;
const NEEDS_MIN_CHARS: usize = 10;
const NEEDS_MAX_CHARS: usize = 300;
const MIN_RESPONSE_CHARS: usize = 10;
const MAX_ACTIONS: usize = 5;

/// Violations of the analysis output contract
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The value does not have the expected shape at all (missing fields,
    /// unknown emotion label or category, wrong types)
    #[error("response shape mismatch: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("expected {MIN_EMOTIONS}-{MAX_EMOTIONS} emotions, got {0}")]
    EmotionCount(usize),

    #[error("emotion label {0:?} appears more than once")]
    DuplicateEmotion(EmotionLabel),

    #[error("emotion score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("summary must be {SUMMARY_MIN_CHARS}-{SUMMARY_MAX_CHARS} characters, got {0}")]
    SummaryLength(usize),

    #[error("needs must be {NEEDS_MIN_CHARS}-{NEEDS_MAX_CHARS} characters, got {0}")]
    NeedsLength(usize),

    #[error("response.{field} must be at least {MIN_RESPONSE_CHARS} characters, got {len}")]
    ResponseTooShort { field: &'static str, len: usize },

    #[error("expected 1-{MAX_ACTIONS} actions for risk level {risk:?}, got {count}")]
    ActionCount { count: usize, risk: RiskLevel },

    #[error("action {index} has an empty {field}")]
    EmptyActionField { index: usize, field: &'static str },
}

/// Validate an untyped JSON value against the analysis output schema
///
/// Phase 1 deserializes into the typed shape, which already rejects
/// unknown emotion labels, action categories, and risk levels. Phase 2
/// checks the bounds the type system cannot express. Lengths are counted
/// in Unicode characters, not bytes.
///
/// Actions may be empty only for high-risk results: a crisis response
/// legitimately carries no recommendations, while every other result must
/// offer at least one.
pub fn validate_analysis(value: serde_json::Value) -> Result<AnalysisResult, SchemaError> {
    let result: AnalysisResult = serde_json::from_value(value)?;

    if result.emotions.len() < MIN_EMOTIONS || result.emotions.len() > MAX_EMOTIONS {
        return Err(SchemaError::EmotionCount(result.emotions.len()));
    }

    let mut seen_labels = HashSet::new();
    for emotion in &result.emotions {
        if !seen_labels.insert(emotion.label) {
            return Err(SchemaError::DuplicateEmotion(emotion.label));
        }
        if !(0.0..=1.0).contains(&emotion.score) || !emotion.score.is_finite() {
            return Err(SchemaError::ScoreOutOfRange(emotion.score));
        }
    }

    let summary_len = result.summary.chars().count();
    if summary_len < SUMMARY_MIN_CHARS || summary_len > SUMMARY_MAX_CHARS {
        return Err(SchemaError::SummaryLength(summary_len));
    }

    let needs_len = result.needs.chars().count();
    if needs_len < NEEDS_MIN_CHARS || needs_len > NEEDS_MAX_CHARS {
        return Err(SchemaError::NeedsLength(needs_len));
    }

    let empathy_len = result.response.empathy.chars().count();
    if empathy_len < MIN_RESPONSE_CHARS {
        return Err(SchemaError::ResponseTooShort {
            field: "empathy",
            len: empathy_len,
        });
    }

    let advice_len = result.response.advice.chars().count();
    if advice_len < MIN_RESPONSE_CHARS {
        return Err(SchemaError::ResponseTooShort {
            field: "advice",
            len: advice_len,
        });
    }

    let min_actions = if result.risk_level == RiskLevel::High {
        0
    } else {
        1
    };
    if result.actions.len() < min_actions || result.actions.len() > MAX_ACTIONS {
        return Err(SchemaError::ActionCount {
            count: result.actions.len(),
            risk: result.risk_level,
        });
    }

    for (index, action) in result.actions.iter().enumerate() {
        if action.id.trim().is_empty() {
            return Err(SchemaError::EmptyActionField { index, field: "id" });
        }
        if action.title.trim().is_empty() {
            return Err(SchemaError::EmptyActionField { index, field: "title" });
        }
        if action.description.trim().is_empty() {
            return Err(SchemaError::EmptyActionField {
                index,
                field: "description",
            });
        }
    }

    Ok(result)
}
