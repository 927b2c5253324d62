//! Filtering and ordering of ranking entries.
//!
//! [`apply`] is a pure function of its inputs: the same records and spec
//! always produce the same, stably ordered view.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::record::RankingEntry;

/// Ordering applied to the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Rank, best first.
    #[default]
    RankAsc,
    /// Rank, worst first.
    RankDesc,
    /// Score, lowest first.
    ScoreAsc,
    /// Score, highest first.
    ScoreDesc,
    /// University name, A to Z.
    NameAsc,
    /// University name, Z to A.
    NameDesc,
    /// Country name, A to Z.
    CountryAsc,
}

impl SortKey {
    /// Every sort key in menu order.
    pub const ALL: [SortKey; 7] = [
        Self::RankAsc,
        Self::RankDesc,
        Self::ScoreAsc,
        Self::ScoreDesc,
        Self::NameAsc,
        Self::NameDesc,
        Self::CountryAsc,
    ];

    /// The kebab-case name used in input and serialized state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankAsc => "rank-asc",
            Self::RankDesc => "rank-desc",
            Self::ScoreAsc => "score-asc",
            Self::ScoreDesc => "score-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::CountryAsc => "country-asc",
        }
    }

    /// Human-readable description for the active filter summary.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::RankAsc => "Rank (best first)",
            Self::RankDesc => "Rank (worst first)",
            Self::ScoreAsc => "Score (low to high)",
            Self::ScoreDesc => "Score (high to low)",
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::CountryAsc => "Country (A-Z)",
        }
    }

    fn compare(self, a: &RankingEntry, b: &RankingEntry) -> Ordering {
        match self {
            Self::RankAsc => a.rank.cmp(&b.rank),
            Self::RankDesc => b.rank.cmp(&a.rank),
            Self::ScoreAsc => a.sort_score().total_cmp(&b.sort_score()),
            Self::ScoreDesc => b.sort_score().total_cmp(&a.sort_score()),
            Self::NameAsc => collate(&a.university, &b.university),
            Self::NameDesc => collate(&b.university, &a.university),
            Self::CountryAsc => collate(&a.country, &b.country),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key: {}", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSortKey(wanted.to_string()))
    }
}

/// Locale-aware string ordering.
///
/// Strings compare by their base letters first, with diacritics removed and
/// case folded, so "École" sorts among the E's and "berlin" next to "Berlin".
/// Accents and then case break ties, and the raw strings make the order
/// total.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| a.cmp(b))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

/// Query controls exactly as the user entered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawQuery {
    /// Free-text search box.
    pub text: String,
    /// Selected country, empty for all.
    pub country: String,
    /// Minimum rank box.
    pub rank_min: String,
    /// Maximum rank box.
    pub rank_max: String,
    /// Selected sort key name.
    pub sort: String,
}

/// A coerced, ready-to-apply query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Case-insensitive substring matched against university and country.
    pub text: String,
    /// Exact country match; empty matches every country.
    pub country: String,
    /// Inclusive lower rank bound.
    pub rank_min: Option<i64>,
    /// Inclusive upper rank bound.
    pub rank_max: Option<i64>,
    /// Ordering of the result.
    pub sort_key: SortKey,
}

impl QuerySpec {
    /// Coerce raw control values into a spec.
    ///
    /// Inputs never fail: a rank bound that is not an integer is ignored and
    /// an unknown sort key falls back to the default ordering.
    #[must_use]
    pub fn from_raw(raw: &RawQuery) -> Self {
        Self {
            text: raw.text.trim().to_string(),
            country: raw.country.trim().to_string(),
            rank_min: parse_bound(&raw.rank_min),
            rank_max: parse_bound(&raw.rank_max),
            sort_key: raw.sort.parse().unwrap_or_default(),
        }
    }

    /// Check if this spec is the reset state.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether a single entry passes every filter.
    #[must_use]
    pub fn matches(&self, entry: &RankingEntry) -> bool {
        if !self.text.is_empty() {
            let haystack = format!("{} {}", entry.university, entry.country).to_lowercase();
            if !haystack.contains(&self.text.to_lowercase()) {
                return false;
            }
        }
        if !self.country.is_empty() && entry.country != self.country {
            return false;
        }
        let rank = i64::from(entry.rank);
        if self.rank_min.is_some_and(|min| rank < min) {
            return false;
        }
        if self.rank_max.is_some_and(|max| rank > max) {
            return false;
        }
        true
    }

    /// Summary of the filters currently in effect, one line each.
    #[must_use]
    pub fn active_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if !self.text.is_empty() {
            filters.push(format!("Search: \"{}\"", self.text));
        }
        if !self.country.is_empty() {
            filters.push(format!("Country: {}", self.country));
        }
        if let Some(min) = self.rank_min {
            filters.push(format!("Rank >= {min}"));
        }
        if let Some(max) = self.rank_max {
            filters.push(format!("Rank <= {max}"));
        }
        if self.sort_key != SortKey::default() {
            filters.push(format!("Sort: {}", self.sort_key.label()));
        }
        filters
    }
}

fn parse_bound(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Produce the filtered and ordered view of `records`.
#[must_use]
pub fn apply(records: &[RankingEntry], spec: &QuerySpec) -> Vec<RankingEntry> {
    let mut view: Vec<RankingEntry> = records
        .iter()
        .filter(|entry| spec.matches(entry))
        .cloned()
        .collect();
    // sort_by is stable, so ties keep filter order
    view.sort_by(|a, b| spec.sort_key.compare(a, b));
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, university: &str, country: &str, score: Option<f64>) -> RankingEntry {
        RankingEntry::new(rank, university, country, score)
    }

    fn sample() -> Vec<RankingEntry> {
        vec![
            entry(3, "Charles U", "Czechia", Some(70.0)),
            entry(1, "A U", "X", Some(90.0)),
            entry(2, "B U", "Y", Some(80.0)),
            entry(4, "delta Institute", "Y", None),
            entry(5, "Echo College", "X", Some(80.0)),
        ]
    }

    fn names(view: &[RankingEntry]) -> Vec<&str> {
        view.iter().map(|e| e.university.as_str()).collect()
    }

    #[test]
    fn test_default_spec_sorts_by_rank() {
        let view = apply(&sample(), &QuerySpec::default());
        let ranks: Vec<u32> = view.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_text_search_is_case_insensitive_over_name_and_country() {
        let spec = QuerySpec {
            text: "czech".to_string(),
            ..QuerySpec::default()
        };
        assert_eq!(names(&apply(&sample(), &spec)), vec!["Charles U"]);

        let spec = QuerySpec {
            text: "INSTITUTE".to_string(),
            ..QuerySpec::default()
        };
        assert_eq!(names(&apply(&sample(), &spec)), vec!["delta Institute"]);
    }

    #[test]
    fn test_text_search_spans_the_joining_space() {
        let spec = QuerySpec {
            text: "u x".to_string(),
            ..QuerySpec::default()
        };
        assert_eq!(names(&apply(&sample(), &spec)), vec!["A U"]);
    }

    #[test]
    fn test_country_is_exact_match() {
        let spec = QuerySpec {
            country: "Y".to_string(),
            ..QuerySpec::default()
        };
        assert_eq!(names(&apply(&sample(), &spec)), vec!["B U", "delta Institute"]);

        let spec = QuerySpec {
            country: "y".to_string(),
            ..QuerySpec::default()
        };
        assert!(apply(&sample(), &spec).is_empty());
    }

    #[test]
    fn test_rank_bounds_are_inclusive() {
        let spec = QuerySpec {
            rank_min: Some(2),
            rank_max: Some(4),
            ..QuerySpec::default()
        };
        let view = apply(&sample(), &spec);
        assert!(view.iter().all(|e| (2..=4).contains(&e.rank)));
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_inverted_bounds_yield_empty_view() {
        let spec = QuerySpec {
            rank_min: Some(4),
            rank_max: Some(2),
            ..QuerySpec::default()
        };
        assert!(apply(&sample(), &spec).is_empty());
    }

    #[test]
    fn test_score_desc_treats_missing_as_zero_and_is_stable() {
        let spec = QuerySpec {
            sort_key: SortKey::ScoreDesc,
            ..QuerySpec::default()
        };
        let view = apply(&sample(), &spec);
        assert_eq!(
            names(&view),
            vec!["A U", "B U", "Echo College", "Charles U", "delta Institute"]
        );
        assert!(view
            .windows(2)
            .all(|w| w[0].sort_score() >= w[1].sort_score()));
    }

    #[test]
    fn test_score_asc_puts_missing_first() {
        let spec = QuerySpec {
            sort_key: SortKey::ScoreAsc,
            ..QuerySpec::default()
        };
        let view = apply(&sample(), &spec);
        assert_eq!(view[0].university, "delta Institute");
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let spec = QuerySpec {
            sort_key: SortKey::NameAsc,
            ..QuerySpec::default()
        };
        assert_eq!(
            names(&apply(&sample(), &spec)),
            vec!["A U", "B U", "Charles U", "delta Institute", "Echo College"]
        );

        let spec = QuerySpec {
            sort_key: SortKey::NameDesc,
            ..QuerySpec::default()
        };
        assert_eq!(
            names(&apply(&sample(), &spec)),
            vec!["Echo College", "delta Institute", "Charles U", "B U", "A U"]
        );
    }

    #[test]
    fn test_country_sort_keeps_filter_order_for_ties() {
        let spec = QuerySpec {
            sort_key: SortKey::CountryAsc,
            ..QuerySpec::default()
        };
        assert_eq!(
            names(&apply(&sample(), &spec)),
            vec!["Charles U", "A U", "Echo College", "B U", "delta Institute"]
        );
    }

    #[test]
    fn test_apply_on_empty_input() {
        assert!(apply(&[], &QuerySpec::default()).is_empty());
    }

    #[test]
    fn test_apply_is_deterministic() {
        let spec = QuerySpec {
            sort_key: SortKey::ScoreDesc,
            ..QuerySpec::default()
        };
        assert_eq!(apply(&sample(), &spec), apply(&sample(), &spec));
    }

    #[test]
    fn test_from_raw_coerces_inputs() {
        let raw = RawQuery {
            text: "  oxford ".to_string(),
            country: " UK".to_string(),
            rank_min: "ten".to_string(),
            rank_max: " 50 ".to_string(),
            sort: "score-desc".to_string(),
        };
        let spec = QuerySpec::from_raw(&raw);
        assert_eq!(spec.text, "oxford");
        assert_eq!(spec.country, "UK");
        assert_eq!(spec.rank_min, None);
        assert_eq!(spec.rank_max, Some(50));
        assert_eq!(spec.sort_key, SortKey::ScoreDesc);
    }

    #[test]
    fn test_from_raw_unknown_sort_falls_back() {
        let raw = RawQuery {
            sort: "by-vibes".to_string(),
            ..RawQuery::default()
        };
        assert_eq!(QuerySpec::from_raw(&raw).sort_key, SortKey::RankAsc);
        assert!(QuerySpec::from_raw(&RawQuery::default()).is_default());
    }

    #[test]
    fn test_sort_key_round_trips_through_str() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>(), Ok(key));
        }
        assert!("nope".parse::<SortKey>().is_err());
        assert_eq!("Name-Desc".parse::<SortKey>(), Ok(SortKey::NameDesc));
    }

    #[test]
    fn test_sort_key_serde_names() {
        let json = serde_json::to_string(&SortKey::CountryAsc).unwrap();
        assert_eq!(json, "\"country-asc\"");
    }

    #[test]
    fn test_active_filters() {
        assert!(QuerySpec::default().active_filters().is_empty());

        let spec = QuerySpec {
            text: "tech".to_string(),
            country: "Y".to_string(),
            rank_min: Some(1),
            rank_max: Some(100),
            sort_key: SortKey::NameAsc,
        };
        assert_eq!(
            spec.active_filters(),
            vec![
                "Search: \"tech\"",
                "Country: Y",
                "Rank >= 1",
                "Rank <= 100",
                "Sort: Name (A-Z)",
            ]
        );
    }

    #[test]
    fn test_collate() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Berlin", "berlin"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_collate_ignores_diacritics_first() {
        assert_eq!(collate("École", "Universität"), Ordering::Less);
        assert_eq!(collate("Universität", "Zurich"), Ordering::Less);
        assert_eq!(collate("Ecole", "École"), Ordering::Less);
        assert_eq!(collate("École", "Ecole"), Ordering::Greater);
    }

    #[test]
    fn test_name_sort_with_accented_names() {
        let records = vec![
            entry(1, "Zurich U", "CH", None),
            entry(2, "École Polytechnique", "FR", None),
            entry(3, "Aalto", "FI", None),
            entry(4, "Universität Wien", "AT", None),
        ];
        let spec = QuerySpec {
            sort_key: SortKey::NameAsc,
            ..QuerySpec::default()
        };
        let names: Vec<String> = apply(&records, &spec)
            .into_iter()
            .map(|e| e.university)
            .collect();
        assert_eq!(
            names,
            vec!["Aalto", "École Polytechnique", "Universität Wien", "Zurich U"]
        );
    }

    #[test]
    fn test_country_sort_with_accented_names() {
        let records = vec![
            entry(1, "A", "Österreich", None),
            entry(2, "B", "Zambia", None),
            entry(3, "C", "Norway", None),
        ];
        let spec = QuerySpec {
            sort_key: SortKey::CountryAsc,
            ..QuerySpec::default()
        };
        let countries: Vec<String> = apply(&records, &spec)
            .into_iter()
            .map(|e| e.country)
            .collect();
        assert_eq!(countries, vec!["Norway", "Österreich", "Zambia"]);
    }
}
