//! Star ratings aggregated per university.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lowest accepted vote.
pub const MIN_STARS: u8 = 1;

/// Highest accepted vote.
pub const MAX_STARS: u8 = 5;

/// Running total of the votes cast for one university.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingAggregate {
    /// Sum of all votes.
    pub sum: u64,
    /// Number of votes.
    pub count: u64,
}

impl RatingAggregate {
    /// Add one vote.
    pub fn add(&mut self, stars: u8) {
        self.sum += u64::from(stars);
        self.count += 1;
    }

    /// Mean vote, or `None` with no votes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Clamp a vote into the accepted star range.
#[must_use]
pub fn clamp_stars(value: i64) -> u8 {
    let clamped = value.clamp(i64::from(MIN_STARS), i64::from(MAX_STARS));
    u8::try_from(clamped).unwrap_or(MAX_STARS)
}

/// Ratings keyed by the raw university string.
///
/// Differently spelled names are different keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratings {
    by_university: BTreeMap<String, RatingAggregate>,
}

impl Ratings {
    /// Create an empty set of ratings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one vote, creating the aggregate on first use.
    pub fn record(&mut self, university: &str, stars: u8) {
        self.by_university
            .entry(university.to_string())
            .or_default()
            .add(stars);
    }

    /// The aggregate for `university`, if any votes were cast.
    #[must_use]
    pub fn get(&self, university: &str) -> Option<&RatingAggregate> {
        self.by_university.get(university)
    }

    /// Number of universities with at least one vote.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_university.len()
    }

    /// Check if no votes have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_university.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let mut aggregate = RatingAggregate::default();
        assert_eq!(aggregate.average(), None);

        aggregate.add(4);
        aggregate.add(5);
        assert_eq!(aggregate, RatingAggregate { sum: 9, count: 2 });
        assert_eq!(aggregate.average(), Some(4.5));
    }

    #[test]
    fn test_record_is_order_independent() {
        let mut batched = Ratings::new();
        for stars in [3, 5, 4] {
            batched.record("A U", stars);
        }

        let mut split = Ratings::new();
        for stars in [3, 5] {
            split.record("A U", stars);
        }
        split.record("A U", 4);

        assert_eq!(batched, split);
        assert_eq!(
            batched.get("A U"),
            Some(&RatingAggregate { sum: 12, count: 3 })
        );
    }

    #[test]
    fn test_keys_are_raw_strings() {
        let mut ratings = Ratings::new();
        ratings.record("MIT", 5);
        ratings.record("M.I.T.", 3);
        assert_eq!(ratings.len(), 2);
        assert!(ratings.get("mit").is_none());
    }

    #[test]
    fn test_clamp_stars() {
        assert_eq!(clamp_stars(0), 1);
        assert_eq!(clamp_stars(-7), 1);
        assert_eq!(clamp_stars(3), 3);
        assert_eq!(clamp_stars(9), 5);
    }

    #[test]
    fn test_serialized_shape() {
        let mut ratings = Ratings::new();
        ratings.record("A U", 4);
        let json = serde_json::to_string(&ratings).unwrap();
        assert_eq!(json, r#"{"A U":{"sum":4,"count":1}}"#);

        let back: Ratings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ratings);
    }
}
