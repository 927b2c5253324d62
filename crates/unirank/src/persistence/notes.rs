//! Free-text notes about universities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ratings::{MAX_STARS, MIN_STARS};

/// Author recorded when none is given.
pub const DEFAULT_AUTHOR: &str = "anon";

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// A submitted note. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Who wrote the note.
    #[serde(default = "default_author")]
    pub author: String,
    /// University the note is about; may be empty.
    #[serde(default)]
    pub university: String,
    /// Note body; may be empty.
    #[serde(default)]
    pub text: String,
    /// Optional star rating attached to the note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Submission time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Note fields as entered, before coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    /// Author field.
    pub author: String,
    /// University field.
    pub university: String,
    /// Body text.
    pub text: String,
    /// Star rating, if one was picked.
    pub rating: Option<i64>,
}

impl Note {
    /// Build a note from a draft, stamped with the current time.
    #[must_use]
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self::from_draft_at(draft, Utc::now().timestamp_millis())
    }

    /// Build a note from a draft with an explicit timestamp.
    ///
    /// A blank author becomes [`DEFAULT_AUTHOR`]; a rating outside 1-5 is
    /// dropped. The university is kept as entered, matching rating keys.
    #[must_use]
    pub fn from_draft_at(draft: NoteDraft, timestamp: i64) -> Self {
        let author = draft.author.trim();
        Self {
            author: if author.is_empty() {
                default_author()
            } else {
                author.to_string()
            },
            university: draft.university,
            text: draft.text.trim().to_string(),
            rating: draft
                .rating
                .and_then(|r| u8::try_from(r).ok())
                .filter(|r| (MIN_STARS..=MAX_STARS).contains(r)),
            timestamp,
        }
    }

    /// Submission time as a UTC date, if the timestamp is in range.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
