use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tweetsmith_core::TimeSlot;

/// Maximum characters of post text kept in a record.
pub const STORED_TEXT_CHARS: usize = 100;

/// One published (or dry-run) post.
///
/// Timestamps are local wall-clock times; the slot is derived from
/// `timestamp` rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    #[serde(alias = "story")]
    pub text: String,
    #[serde(default)]
    pub image_path: Option<String>,
    pub posted_at: NaiveDateTime,
}

impl PostRecord {
    /// Build a record for a post made at `at`, truncating the text for storage.
    #[must_use]
    pub fn new(text: &str, image_path: Option<&Path>, at: NaiveDateTime) -> Self {
        Self {
            date: at.date(),
            timestamp: at,
            text: text.chars().take(STORED_TEXT_CHARS).collect(),
            image_path: image_path.map(|p| p.display().to_string()),
            posted_at: at,
        }
    }

    #[must_use]
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::of(&self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn new_truncates_text_by_characters() {
        let text = "é".repeat(150);
        let record = PostRecord::new(&text, None, at("2025-03-01 09:00:00"));
        assert_eq!(record.text.chars().count(), STORED_TEXT_CHARS);
    }

    #[test]
    fn slot_follows_timestamp_hour() {
        let morning = PostRecord::new("a", None, at("2025-03-01 11:59:59"));
        let evening = PostRecord::new("b", None, at("2025-03-01 12:00:00"));
        assert_eq!(morning.slot(), TimeSlot::Morning);
        assert_eq!(evening.slot(), TimeSlot::Evening);
    }

    #[test]
    fn deserializes_legacy_story_field_and_fractional_seconds() {
        let json = r#"{
            "date": "2025-03-01",
            "timestamp": "2025-03-01T09:00:03.512345",
            "story": "Once upon a time.",
            "image_path": null,
            "posted_at": "2025-03-01T09:00:04.000001"
        }"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.text, "Once upon a time.");
        assert_eq!(record.slot(), TimeSlot::Morning);
        assert!(record.image_path.is_none());
    }
}
