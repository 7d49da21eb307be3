//! Inbound analysis requests and input validation
//!
//! Validation is the first gate: malformed or abusive input is rejected
//! before any prompt is built or any network call is made. The rules run
//! in a fixed order and short-circuit on the first failure. The validated
//! request is immutable; fields are private so an unvalidated instance
//! cannot exist.

use crate::analysis::types::{ActivityLevel, Condition, MealAmount, SleepQuality};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text length bounds in characters, after trimming
const MIN_TEXT_CHARS: usize = 20;
const MAX_TEXT_CHARS: usize = 2000;

/// A run of one repeated character at least this long fails validation
const MAX_REPEAT_RUN: usize = 10;

/// Below this length, text without any whitespace is not sentence-like
const SENTENCE_LIKE_CHARS: usize = 30;

const MAX_INTENSITY: u8 = 5;
const MAX_TAGS: usize = 5;
const MAX_TAG_CHARS: usize = 20;

/// Fixed denylist of spam/test content, matched case-insensitively as
/// substrings of the entry text
const BLOCKED_KEYWORDS: &[&str] = &[
    // Loan spam
    "대출",
    "사업자금",
    "무담보",
    "무보증",
    "저금리",
    // Promotional spam
    "홍보",
    "광고",
    "마케팅",
    "홍보문의",
    // Test / keyboard-mash entries
    "test",
    "ㅁㄴㅇㄹ",
];

/// Why an inbound request was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entry text is empty")]
    Empty,

    #[error("entry text must be at least {MIN_TEXT_CHARS} characters, got {0}")]
    TooShort(usize),

    #[error("entry text must be at most {MAX_TEXT_CHARS} characters, got {0}")]
    TooLong(usize),

    #[error("entry text repeats a single character {0} times in a row")]
    RepeatedCharacters(usize),

    #[error("entry text contains blocked content")]
    BlockedContent,

    #[error("entry text is too short to be sentence-like; write it out in words")]
    NotSentenceLike,

    #[error("intensity must be between 0 and {MAX_INTENSITY}, got {0}")]
    IntensityOutOfRange(u8),

    #[error("tags must start with '#' (e.g. #school #friends)")]
    NoHashTags,

    #[error("at most {MAX_TAGS} tags are allowed, got {0}")]
    TooManyTags(usize),

    #[error("tag '{0}' exceeds {MAX_TAG_CHARS} characters")]
    TagTooLong(String),
}

/// Condition as submitted by the client: any subset of the three fields
///
/// Completeness is not a validation concern; the post-processor persists a
/// condition only when all three fields are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCondition {
    pub sleep: Option<SleepQuality>,
    pub meal: Option<MealAmount>,
    pub activity: Option<ActivityLevel>,
}

impl RequestCondition {
    /// The persisted form of this condition, if every field was supplied
    pub fn complete(&self) -> Option<Condition> {
        Some(Condition {
            sleep: self.sleep?,
            meal: self.meal?,
            activity: self.activity?,
        })
    }
}

/// The analyze request body exactly as deserialized, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default)]
    pub condition: Option<RequestCondition>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A validated analysis request
///
/// Holds the trimmed entry text and the parsed `#`-tags. Instances only
/// come out of [`AnalysisRequest::validate`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    text: String,
    intensity: Option<u8>,
    condition: Option<RequestCondition>,
    tags: Option<Vec<String>>,
}

impl AnalysisRequest {
    /// Validate a raw request, producing the immutable validated form
    ///
    /// Rules run in order and short-circuit on the first failure:
    /// emptiness, length bounds, repeated-character runs, the keyword
    /// denylist, sentence-likeness, intensity range, then tags. Lengths
    /// are counted in Unicode characters, not bytes.
    pub fn validate(raw: RawAnalysisRequest) -> Result<Self, ValidationError> {
        let trimmed = raw.text.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let char_count = trimmed.chars().count();
        if char_count < MIN_TEXT_CHARS {
            return Err(ValidationError::TooShort(char_count));
        }
        if char_count > MAX_TEXT_CHARS {
            return Err(ValidationError::TooLong(char_count));
        }

        if let Some(run) = longest_repeat_run(trimmed)
            && run >= MAX_REPEAT_RUN
        {
            return Err(ValidationError::RepeatedCharacters(run));
        }

        let lowered = trimmed.to_lowercase();
        if BLOCKED_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(*keyword))
        {
            return Err(ValidationError::BlockedContent);
        }

        if char_count < SENTENCE_LIKE_CHARS && !trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::NotSentenceLike);
        }

        if let Some(intensity) = raw.intensity
            && intensity > MAX_INTENSITY
        {
            return Err(ValidationError::IntensityOutOfRange(intensity));
        }

        let tags = match raw.tags {
            Some(tags) => parse_tags(&tags.join(" "))?,
            None => None,
        };

        Ok(Self {
            text: trimmed.to_string(),
            intensity: raw.intensity,
            condition: raw.condition,
            tags,
        })
    }

    /// Get the trimmed entry text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the emotional intensity, if supplied (0-5)
    pub fn intensity(&self) -> Option<u8> {
        self.intensity
    }

    /// Get the submitted condition, if any (possibly partial)
    pub fn condition(&self) -> Option<&RequestCondition> {
        self.condition.as_ref()
    }

    /// Get the parsed `#`-tags, if any were supplied
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }
}

/// Length of the longest run of one repeated character, if the text has
/// any run longer than a single character
fn longest_repeat_run(text: &str) -> Option<usize> {
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    (longest > 1).then_some(longest)
}

/// Parse and validate whitespace-separated tags
///
/// Empty input is not an error; it simply carries no tags. Non-empty
/// input must contain 1 to 5 `#`-prefixed tokens of at most 20 characters
/// each. Tokens without the `#` prefix are discarded, but if none remain
/// the input was not tag-shaped at all and is rejected.
fn parse_tags(raw: &str) -> Result<Option<Vec<String>>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tags: Vec<String> = trimmed
        .split_whitespace()
        .filter(|token| token.starts_with('#'))
        .map(str::to_string)
        .collect();

    if tags.is_empty() {
        return Err(ValidationError::NoHashTags);
    }
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags(tags.len()));
    }
    for tag in &tags {
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(ValidationError::TagTooLong(tag.clone()));
        }
    }

    Ok(Some(tags))
}
