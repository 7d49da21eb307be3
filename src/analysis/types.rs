//! Domain types for emotional analysis results and journal entries
//!
//! Wire names match the client's persisted JSON shape (camelCase except
//! `theory_tags`, which the output contract spells in snake case).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed vocabulary of emotion tags the analysis may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    // Positive
    Joy,
    Excited,
    Calm,
    Gratitude,
    Hopeful,
    Proud,
    Content,
    Relaxed,
    Peaceful,
    Satisfied,
    Loved,
    Confident,
    // Negative - sadness
    Sad,
    Lonely,
    Depressed,
    Helpless,
    Disappointed,
    Hurt,
    // Negative - anxiety
    Anxiety,
    Nervous,
    Worried,
    Scared,
    Overwhelmed,
    Stressed,
    // Negative - anger
    Anger,
    Irritated,
    Frustrated,
    Resentful,
    Betrayed,
    Jealous,
    // Neutral / mixed
    Numb,
    Confused,
    Embarrassed,
    Guilty,
    Ashamed,
    Bored,
    Tired,
    Uncertain,
    Ambivalent,
}

/// A detected emotion with its confidence score in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub label: EmotionLabel,
    pub score: f64,
}

/// Category of a recommended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Music,
    Flower,
    Activity,
    Breathing,
    Writing,
}

/// A recommended action referencing a static catalog entry
///
/// `id` is format-checked against `<category>-<digits>` by the
/// post-processor; whether the id actually exists in the catalog is the
/// catalog collaborator's concern, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub category: ActionCategory,
    pub title: String,
    pub description: String,
    #[serde(rename = "evidenceId", skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<String>,
}

/// Coarse triage signal for crisis-level distress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Empathy and advice text addressed to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub empathy: String,
    pub advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theory_tags: Option<Vec<String>>,
}

/// The structured emotional analysis of one journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub emotions: Vec<Emotion>,
    pub summary: String,
    pub needs: String,
    pub response: ResponseMessage,
    pub actions: Vec<ActionItem>,
    pub risk_level: RiskLevel,
}

/// Sleep quality reported alongside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Bad,
    Normal,
    Good,
}

/// Meal amount reported alongside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealAmount {
    Skipped,
    Light,
    Normal,
    Heavy,
}

/// Physical activity level reported alongside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    None,
    Light,
    Moderate,
    Intense,
}

/// Fully-specified condition persisted on a journal entry
///
/// Only complete conditions are persisted; a partially-filled condition on
/// the inbound request is dropped by the post-processor rather than stored
/// with missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub sleep: SleepQuality,
    pub meal: MealAmount,
    pub activity: ActivityLevel,
}

/// One persisted journal entry: the user's text plus its analysis
///
/// Created once per successful submission and returned to the caller,
/// which owns persistence. The core never mutates an entry after
/// construction; `completed_actions` is maintained client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    pub analysis: AnalysisResult,
    pub completed_actions: Vec<String>,
}
