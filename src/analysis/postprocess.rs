//! Result post-processing and journal entry assembly
//!
//! Runs after the orchestrator has produced a schema-valid analysis:
//! drops actions whose catalog id is malformed, guarantees the user never
//! sees an empty recommendation panel during ordinary distress, and
//! assembles the journal entry the caller persists. A crisis result is
//! the exception: when risk is high, actions stay empty, because a crisis
//! response must never imply "go listen to music" in place of seeking
//! help.

use crate::analysis::fallback::default_safe_action;
use crate::analysis::request::AnalysisRequest;
use crate::analysis::types::{ActionItem, AnalysisResult, JournalEntry, RiskLevel};
use chrono::Utc;
use uuid::Uuid;

/// Check an action id against the `<category>-<digits>` catalog format
///
/// Format only: whether `music-999` actually exists in the catalog is the
/// catalog collaborator's concern.
pub fn is_valid_action_id(id: &str) -> bool {
    let Some((category, digits)) = id.split_once('-') else {
        return false;
    };
    matches!(
        category,
        "music" | "activity" | "flower" | "breathing" | "writing"
    ) && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Keep only actions with well-formed catalog ids, logging the rest
pub fn filter_actions(actions: Vec<ActionItem>) -> Vec<ActionItem> {
    actions
        .into_iter()
        .filter(|action| {
            let keep = is_valid_action_id(&action.id);
            if !keep {
                tracing::warn!(action_id = %action.id, "dropping action with malformed catalog id");
            }
            keep
        })
        .collect()
}

/// Finalize an analysis into a persisted-shape journal entry
///
/// Always succeeds. Applies the action filter and default-action
/// guarantee, then stamps the entry with a fresh id and timestamp. A
/// partial condition is dropped entirely rather than persisted with
/// missing fields.
pub fn finalize(mut analysis: AnalysisResult, request: &AnalysisRequest) -> JournalEntry {
    analysis.actions = filter_actions(std::mem::take(&mut analysis.actions));

    if analysis.actions.is_empty() && analysis.risk_level != RiskLevel::High {
        tracing::warn!("no action survived filtering, injecting the default safe action");
        analysis.actions.push(default_safe_action());
    }

    JournalEntry {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        text: request.text().to_string(),
        condition: request.condition().and_then(|c| c.complete()),
        tags: request.tags().map(<[String]>::to_vec),
        intensity: request.intensity(),
        analysis,
        completed_actions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fallback::fallback_analysis;
    use crate::analysis::request::{RawAnalysisRequest, RequestCondition};
    use crate::analysis::types::{ActionCategory, ActivityLevel, MealAmount, SleepQuality};

    fn action(id: &str) -> ActionItem {
        ActionItem {
            id: id.to_string(),
            category: ActionCategory::Music,
            title: "Some title".to_string(),
            description: "Some description".to_string(),
            evidence_id: None,
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::validate(RawAnalysisRequest {
            text: "Today was rough at school and I could not shake it.".to_string(),
            intensity: Some(3),
            condition: None,
            tags: None,
        })
        .unwrap()
    }

    #[test]
    fn test_action_id_format() {
        assert!(is_valid_action_id("music-001"));
        assert!(is_valid_action_id("breathing-05"));
        assert!(is_valid_action_id("activity-010"));

        assert!(!is_valid_action_id("bogus"));
        assert!(!is_valid_action_id("music-"));
        assert!(!is_valid_action_id("music-0a1"));
        assert!(!is_valid_action_id("music-00-1"));
        assert!(!is_valid_action_id("podcast-001"));
        assert!(!is_valid_action_id("Music-001"));
    }

    #[test]
    fn test_filter_drops_malformed_ids_only() {
        let filtered = filter_actions(vec![
            action("music-001"),
            action("bogus"),
            action("activity-010"),
        ]);
        let ids: Vec<&str> = filtered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["music-001", "activity-010"]);
    }

    #[test]
    fn test_empty_after_filter_low_risk_injects_default() {
        let mut analysis = fallback_analysis();
        analysis.actions = vec![action("bogus")];
        analysis.risk_level = RiskLevel::Low;

        let entry = finalize(analysis, &request());
        assert_eq!(entry.analysis.actions.len(), 1);
        assert_eq!(entry.analysis.actions[0].id, "music-001");
    }

    #[test]
    fn test_empty_after_filter_high_risk_stays_empty() {
        let mut analysis = fallback_analysis();
        analysis.actions = vec![];
        analysis.risk_level = RiskLevel::High;

        let entry = finalize(analysis, &request());
        assert!(entry.analysis.actions.is_empty(), "no injection for crisis results");
    }

    #[test]
    fn test_finalize_is_idempotent_on_valid_results() {
        let entry = finalize(fallback_analysis(), &request());
        let again = finalize(entry.analysis.clone(), &request());
        assert_eq!(entry.analysis, again.analysis);
    }

    #[test]
    fn test_entry_carries_request_fields() {
        let entry = finalize(fallback_analysis(), &request());
        assert_eq!(
            entry.text,
            "Today was rough at school and I could not shake it."
        );
        assert_eq!(entry.intensity, Some(3));
        assert!(entry.completed_actions.is_empty());
    }

    #[test]
    fn test_partial_condition_dropped() {
        let raw = RawAnalysisRequest {
            text: "Today was rough at school and I could not shake it.".to_string(),
            intensity: None,
            condition: Some(RequestCondition {
                sleep: Some(SleepQuality::Bad),
                meal: Some(MealAmount::Light),
                activity: None,
            }),
            tags: None,
        };
        let request = AnalysisRequest::validate(raw).unwrap();
        let entry = finalize(fallback_analysis(), &request);
        assert!(entry.condition.is_none(), "partial conditions are not persisted");
    }

    #[test]
    fn test_complete_condition_kept() {
        let raw = RawAnalysisRequest {
            text: "Today was rough at school and I could not shake it.".to_string(),
            intensity: None,
            condition: Some(RequestCondition {
                sleep: Some(SleepQuality::Bad),
                meal: Some(MealAmount::Light),
                activity: Some(ActivityLevel::None),
            }),
            tags: None,
        };
        let request = AnalysisRequest::validate(raw).unwrap();
        let entry = finalize(fallback_analysis(), &request);
        let condition = entry.condition.expect("complete condition is persisted");
        assert_eq!(condition.sleep, SleepQuality::Bad);
        assert_eq!(condition.activity, ActivityLevel::None);
    }

    #[test]
    fn test_entries_get_unique_ids() {
        let first = finalize(fallback_analysis(), &request());
        let second = finalize(fallback_analysis(), &request());
        assert_ne!(first.id, second.id);
    }
}
