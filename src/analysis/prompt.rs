//! Prompt construction for analysis requests
//!
//! Pure and deterministic: the same request always renders the same
//! prompt. The system instruction fixes the assistant's role, its
//! prohibitions, the output JSON shape, the emotion vocabulary, the
//! catalog id ranges, and the risk rules, with two worked examples. The
//! user message carries the entry plus a response-size directive
//! proportional to how much the user wrote.

use crate::analysis::request::AnalysisRequest;
use crate::analysis::types::{ActivityLevel, MealAmount, SleepQuality};

/// Fixed system instruction prepended to every analysis prompt
pub const SYSTEM_PROMPT: &str = r#"You are the analysis engine of an emotional journaling app.

IMPORTANT: Respond with valid JSON only. Never include explanations, markdown, or any text outside the JSON object.

# Role
- Analyze emotions in detail, grounded in counseling theory (CBT, Rogers, Maslow, SDT, ACT).
- Empathize and advise in the warm, informal tone of a close friend.
- Recommend actions only from the provided catalog ids.

# Prohibitions
- No medical diagnoses or treatment suggestions (e.g. "you have depression", "take medication").
- No exaggerated certainty (e.g. "everything will definitely be fine").
- No guilt-tripping (e.g. "why did you do that?").
- No minimizing (e.g. "that's nothing to be upset about").
- No music or activities that are not in the catalog.

# Output shape (JSON only)
{
  "emotions": [
    { "label": "emotion label", "score": 0.0-1.0 }
  ],
  "summary": "1-3 line summary of the key event",
  "needs": "interpretation of the underlying need (Maslow/SDT)",
  "response": {
    "empathy": "empathy message, informal tone",
    "advice": "advice, informal tone"
  },
  "actions": [
    {
      "id": "catalog id (e.g. music-001)",
      "category": "music|flower|activity|breathing|writing",
      "title": "title",
      "description": "description"
    }
  ],
  "riskLevel": "low|medium|high"
}

# Emotion labels (use only these)
Positive: joy, excited, calm, gratitude, hopeful, proud, content, relaxed, peaceful, satisfied, loved, confident
Negative-sadness: sad, lonely, depressed, helpless, disappointed, hurt
Negative-anxiety: anxiety, nervous, worried, scared, overwhelmed, stressed
Negative-anger: anger, irritated, frustrated, resentful, betrayed, jealous
Neutral/mixed: numb, confused, embarrassed, guilty, ashamed, bored, tired, uncertain, ambivalent

# Catalog ids (use only these ranges)
Music: music-001 to music-016
Flowers: flower-001 to flower-008
Activities: activity-001 to activity-010
Breathing: breathing-001 to breathing-005
Writing: writing-001 to writing-005

# Safety rules
- If the entry mentions self-harm, suicide, or ending one's life, set riskLevel to "high" and leave actions empty.
- For moderate signals (persistent lethargy, ongoing depressed mood), set riskLevel to "medium".
- For everyday emotions, set riskLevel to "low".

# Example response (ordinary entry)
Input: "A friend said something hurtful today. I feel awful."
Output:
{
  "emotions": [
    { "label": "sad", "score": 0.7 },
    { "label": "hurt", "score": 0.6 },
    { "label": "disappointed", "score": 0.5 }
  ],
  "summary": "You were hurt by something a friend said.",
  "needs": "Belonging and repairing the relationship.",
  "response": {
    "empathy": "Hearing something hurtful from a friend really stings. Feeling awful about it is completely natural.",
    "advice": "Give yourself a little distance tonight to sort out the feeling. You can always talk it through calmly later."
  },
  "actions": [
    {
      "id": "music-001",
      "category": "music",
      "title": "A song for hard days",
      "description": "Lyrics about coming through rough times can feel deeply comforting, and the slow tempo settles the mind."
    },
    {
      "id": "writing-002",
      "category": "writing",
      "title": "Write the unsent letter",
      "description": "Putting what you wish you had said on paper helps untangle the feeling without any pressure to send it."
    }
  ],
  "riskLevel": "low"
}

# Example response (risk signal)
Input: "I don't want to live anymore. I want to die."
Output:
{
  "emotions": [
    { "label": "depressed", "score": 0.9 },
    { "label": "helpless", "score": 0.8 }
  ],
  "summary": "You are going through something very hard right now.",
  "needs": "Immediate professional support.",
  "response": {
    "empathy": "This sounds incredibly painful. Please remember you are not alone in this.",
    "advice": "Right now is the time to reach out to a professional. Please call a crisis line and talk to someone."
  },
  "actions": [],
  "riskLevel": "high"
}

IMPORTANT: Respond with JSON only. No extra commentary, no markdown."#;

/// Response-size ladder over non-blank line counts: (bucket ceiling, sentences)
///
/// Tuning constants kept for behavioral compatibility; they are not
/// derived from anything.
const LINE_BUCKETS: &[(usize, usize)] = &[(2, 5), (5, 6), (10, 7), (20, 8), (35, 9)];

/// Response-size ladder over character counts, used for single-line entries
const CHAR_BUCKETS: &[(usize, usize)] = &[(120, 5), (300, 6), (600, 7), (1000, 8), (1600, 9)];

/// Sentence count when the entry overflows every bucket
const MAX_RESPONSE_LINES: usize = 10;

/// Compute the target sentence count (5-10) for the empathy and advice
/// fields, proportional to how much the user wrote
pub fn response_line_target(text: &str) -> usize {
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    if lines > 1 {
        bucket(LINE_BUCKETS, lines)
    } else {
        bucket(CHAR_BUCKETS, text.chars().count())
    }
}

fn bucket(ladder: &[(usize, usize)], measure: usize) -> usize {
    ladder
        .iter()
        .find(|(ceiling, _)| measure <= *ceiling)
        .map(|(_, lines)| *lines)
        .unwrap_or(MAX_RESPONSE_LINES)
}

/// Render the user message for a validated request
///
/// Deterministic: the entry text, then optional intensity, condition, and
/// tag context lines, then the response-size directive.
pub fn build_user_message(request: &AnalysisRequest) -> String {
    let mut message = format!("Journal entry:\n{}", request.text());

    if let Some(intensity) = request.intensity() {
        message.push_str(&format!("\n\nEmotional intensity: {intensity}/5"));
    }

    if let Some(condition) = request.condition() {
        let mut parts: Vec<String> = Vec::new();
        if let Some(sleep) = condition.sleep {
            parts.push(format!("sleep: {}", sleep_label(sleep)));
        }
        if let Some(meal) = condition.meal {
            parts.push(format!("meals: {}", meal_label(meal)));
        }
        if let Some(activity) = condition.activity {
            parts.push(format!("activity: {}", activity_label(activity)));
        }
        if !parts.is_empty() {
            message.push_str(&format!("\n\nCondition: {}", parts.join(", ")));
        }
    }

    if let Some(tags) = request.tags()
        && !tags.is_empty()
    {
        message.push_str(&format!("\n\nTags: {}", tags.join(" ")));
    }

    let target = response_line_target(request.text());
    message.push_str(&format!(
        "\n\nResponse length requirement: write the \"empathy\" field as exactly {target} \
        sentences separated by newlines, and the \"advice\" field as exactly {target} \
        sentences separated by newlines. Include at least two sentences of hope or \
        encouragement within the empathy text."
    ));

    message
}

/// Render the full prompt: system instruction plus user message
pub fn build_prompt(request: &AnalysisRequest) -> String {
    format!("{}\n\n{}", SYSTEM_PROMPT, build_user_message(request))
}

fn sleep_label(sleep: SleepQuality) -> &'static str {
    match sleep {
        SleepQuality::Bad => "bad",
        SleepQuality::Normal => "normal",
        SleepQuality::Good => "good",
    }
}

fn meal_label(meal: MealAmount) -> &'static str {
    match meal {
        MealAmount::Skipped => "skipped",
        MealAmount::Light => "light",
        MealAmount::Normal => "normal",
        MealAmount::Heavy => "heavy",
    }
}

fn activity_label(activity: ActivityLevel) -> &'static str {
    match activity {
        ActivityLevel::None => "none",
        ActivityLevel::Light => "light",
        ActivityLevel::Moderate => "moderate",
        ActivityLevel::Intense => "intense",
    }
}
