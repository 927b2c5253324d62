//! Ranking records and the store that holds them.
//!
//! The input is a JSON array of loosely shaped objects. Each element is
//! normalized into a [`RankingEntry`] once at load time; the store is
//! immutable afterwards.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::query::collate;

/// Field names consumed during normalization.
const KNOWN_FIELDS: &[&str] = &["rank", "university", "country", "score"];

/// Legacy alias for `university`.
const LEGACY_NAME_FIELD: &str = "name";

/// One row of the ranking data set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// Position in the ranking, 1-based.
    pub rank: u32,
    /// Display name; also the key ratings and notes are stored under.
    pub university: String,
    /// Country name, empty when not provided.
    pub country: String,
    /// Ranking score, if the source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Fields the source provided that are not used here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RankingEntry {
    /// Create an entry with no extra fields.
    #[must_use]
    pub fn new(
        rank: u32,
        university: impl Into<String>,
        country: impl Into<String>,
        score: Option<f64>,
    ) -> Self {
        Self {
            rank,
            university: university.into(),
            country: country.into(),
            score,
            extra: Map::new(),
        }
    }

    /// Score used for ordering; an absent score orders as zero.
    #[must_use]
    pub fn sort_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Score as displayed and exported; empty when absent.
    #[must_use]
    pub fn score_text(&self) -> String {
        self.score.map(|s| s.to_string()).unwrap_or_default()
    }

    /// Normalize one raw element. `position` is the 1-based index in the input
    /// array and is used when the element has no valid rank.
    ///
    /// Returns `None` when the element has no usable university name.
    fn from_raw(position: u32, raw: &Value) -> Option<Self> {
        let Value::Object(object) = raw else {
            return None;
        };

        let university = object
            .get("university")
            .and_then(non_blank_string)
            .or_else(|| object.get(LEGACY_NAME_FIELD).and_then(non_blank_string))?;

        let rank = object.get("rank").and_then(parse_rank).unwrap_or(position);
        let country = object
            .get("country")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let score = object.get("score").and_then(parse_score);

        let uses_alias = object.get("university").and_then(non_blank_string).is_none();
        let extra = object
            .iter()
            .filter(|(key, _)| {
                !KNOWN_FIELDS.contains(&key.as_str()) && !(uses_alias && key == &LEGACY_NAME_FIELD)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            rank,
            university,
            country,
            score,
            extra,
        })
    }
}

fn non_blank_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// A rank is valid when it is an integer of at least 1, given as a number or
/// as a numeric string.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rank(value: &Value) -> Option<u32> {
    let rank = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(rank).ok().filter(|r| *r >= 1)
}

fn parse_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// The normalized ranking data, loaded once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    entries: Vec<RankingEntry>,
}

impl RecordStore {
    /// A store with no entries, used when loading fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from already normalized entries.
    #[must_use]
    pub fn from_entries(entries: Vec<RankingEntry>) -> Self {
        Self { entries }
    }

    /// Normalize raw JSON elements.
    ///
    /// Elements without a usable university name are skipped, but still count
    /// toward the positions used for rank defaulting.
    #[must_use]
    pub fn from_values(values: &[Value]) -> Self {
        let mut entries = Vec::with_capacity(values.len());
        for (index, raw) in values.iter().enumerate() {
            let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
            match RankingEntry::from_raw(position, raw) {
                Some(entry) => entries.push(entry),
                None => warn!(position, "Skipping ranking record without a university name"),
            }
        }
        debug!("Normalized {} of {} ranking records", entries.len(), values.len());
        Self { entries }
    }

    /// Parse a JSON document holding an array of ranking records.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not an array.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(Error::DataParse)?;
        match value {
            Value::Array(values) => Ok(Self::from_values(&values)),
            other => Err(Error::data_format(format!(
                "expected a JSON array of records, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Load the ranking file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::DataRead {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json_str(&text)?;
        info!("Loaded {} ranking records from {}", store.len(), path.display());
        Ok(store)
    }

    /// All entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct non-empty countries in collation order.
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !entry.country.is_empty() && !countries.contains(&entry.country) {
                countries.push(entry.country.clone());
            }
        }
        countries.sort_by(|a, b| collate(a, b));
        countries
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
