//! The safe fallback analysis
//!
//! Returned whenever the orchestrator exhausts every attempt. The value
//! satisfies the full output schema so downstream consumers never have to
//! special-case it.

use crate::analysis::types::{
    ActionCategory, ActionItem, AnalysisResult, Emotion, EmotionLabel, ResponseMessage, RiskLevel,
};

/// Catalog id of the default soothing-music recommendation
pub const DEFAULT_ACTION_ID: &str = "music-001";

/// The default safe action injected when no valid recommendation survives
/// post-processing (and the one action the fallback analysis carries)
pub fn default_safe_action() -> ActionItem {
    ActionItem {
        id: DEFAULT_ACTION_ID.to_string(),
        category: ActionCategory::Music,
        title: "A quiet song to settle down with".to_string(),
        description: "Slow, gentle music can help your mind come back to rest while you gather \
                      your thoughts."
            .to_string(),
        evidence_id: None,
    }
}

/// The fixed analysis served when no live model invocation succeeds
///
/// One low-confidence "confused" emotion, an apologetic summary and
/// response, the default soothing-music action, and low risk.
pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        emotions: vec![Emotion {
            label: EmotionLabel::Confused,
            score: 0.5,
        }],
        summary: "I couldn't quite understand how you're feeling right now.".to_string(),
        needs: "A calmer moment, and another chance to put it into words.".to_string(),
        response: ResponseMessage {
            empathy: "I'm sorry I couldn't read your feelings properly this time. What you wrote \
                      still matters, and so do you."
                .to_string(),
            advice: "Take a slow breath and try telling me again, maybe with a little more about \
                     what happened."
                .to_string(),
            theory_tags: None,
        },
        actions: vec![default_safe_action()],
        risk_level: RiskLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::schema::validate_analysis;

    #[test]
    fn test_fallback_satisfies_output_schema() {
        let value = serde_json::to_value(fallback_analysis()).expect("should serialize");
        let validated = validate_analysis(value).expect("fallback must be schema-valid");
        assert_eq!(validated, fallback_analysis());
    }

    #[test]
    fn test_fallback_round_trips_through_the_parse_pipeline() {
        let serialized = serde_json::to_string(&fallback_analysis()).unwrap();
        let value = crate::analysis::sanitize::parse(&serialized).expect("should parse");
        let validated = validate_analysis(value).expect("should validate");
        assert_eq!(validated, fallback_analysis());
    }

    #[test]
    fn test_default_action_id_passes_format_filter() {
        assert!(crate::analysis::postprocess::is_valid_action_id(
            DEFAULT_ACTION_ID
        ));
    }
}
