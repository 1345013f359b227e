//! Primary intake (stage 1). Deterministic; never calls the generator.

use chrono::{DateTime, Utc};
use iqraa_core::stage::StageId;
use serde::{Deserialize, Serialize};

use crate::stages::{get_stage, PRIMARY_STAGE};

pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryIntake {
    /// Input with runs of whitespace collapsed to single spaces.
    pub clean_text: String,
    /// Character count of the raw input.
    pub original_length: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub preview: String,
    /// `ar` when the text contains Arabic script, else `en`.
    pub language: String,
    pub next: Vec<StageId>,
    pub received_at: DateTime<Utc>,
}

pub fn primary_intake(input: &str) -> PrimaryIntake {
    let clean_text = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentence_count = clean_text
        .split(['.', '!', '?', '؟'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let next = get_stage(PRIMARY_STAGE)
        .map(|s| s.feeds_into.to_vec())
        .unwrap_or_default();

    PrimaryIntake {
        original_length: input.chars().count(),
        word_count: clean_text.split(' ').filter(|w| !w.is_empty()).count(),
        sentence_count,
        preview: clean_text.chars().take(PREVIEW_CHARS).collect(),
        language: detect_language(input).to_string(),
        next,
        received_at: Utc::now(),
        clean_text,
    }
}

fn detect_language(text: &str) -> &'static str {
    if text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)) {
        "ar"
    } else {
        "en"
    }
}
