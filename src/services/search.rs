// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory story search.
//!
//! Firestore has no full-text search, so candidates are fetched by type and
//! the text, location and age filters are applied here.

use crate::models::{SearchQuery, Story};

/// Maximum number of stories returned by one search.
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Inclusive age bounds parsed from `N` or `N-M`.
///
/// An inverted range (`30-20`) is kept as-is and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub low: u32,
    pub high: u32,
}

impl AgeRange {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.split_once('-') {
            Some((low, high)) => Some(Self {
                low: parse_bound(low)?,
                high: parse_bound(high)?,
            }),
            None => {
                let age = parse_bound(raw)?;
                Some(Self {
                    low: age,
                    high: age,
                })
            }
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        self.low <= age && age <= self.high
    }
}

/// Non-negative decimal bound. Values too large for `u32` saturate, which
/// still lies above every storable age.
fn parse_bound(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse().unwrap_or(u32::MAX))
}

/// Compiled search filters.
#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    text: Option<String>,
    location: Option<String>,
    age_range: Option<AgeRange>,
}

impl StoryFilter {
    pub fn from_query(query: &SearchQuery) -> Self {
        Self {
            text: query.q.as_deref().map(str::to_lowercase),
            location: query.location.as_deref().map(str::to_lowercase),
            // The validator has already checked the pattern
            age_range: query.age_range.as_deref().and_then(AgeRange::parse),
        }
    }

    pub fn matches(&self, story: &Story) -> bool {
        if let Some(location) = &self.location {
            if !story.location.to_lowercase().contains(location) {
                return false;
            }
        }

        if let Some(range) = &self.age_range {
            if !range.contains(u32::from(story.age)) {
                return false;
            }
        }

        if let Some(text) = &self.text {
            let searchable = [
                &story.location,
                &story.current_status,
                &story.aspirations,
                &story.living_conditions,
                &story.duration,
                &story.source,
            ];
            if !searchable.iter().any(|s| s.to_lowercase().contains(text)) {
                return false;
            }
        }

        true
    }

    /// Filter `stories`, keeping input order, capped at [`MAX_SEARCH_RESULTS`].
    pub fn apply(&self, stories: Vec<Story>) -> Vec<Story> {
        stories
            .into_iter()
            .filter(|s| self.matches(s))
            .take(MAX_SEARCH_RESULTS)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExploitationType, Gender};

    fn story(location: &str, age: u8, status: &str) -> Story {
        Story {
            id: "507f1f77bcf86cd799439011".to_string(),
            rescue_date: "2025-01-01".to_string(),
            location: location.to_string(),
            exploitation_type: ExploitationType::Sex,
            duration: "2 years".to_string(),
            current_status: status.to_string(),
            aspirations: "Study nursing".to_string(),
            living_conditions: "Shelter".to_string(),
            age,
            gender: Gender::Female,
            source: "Hotline".to_string(),
            created_by: "user-1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_age_range_parse() {
        assert_eq!(AgeRange::parse("18"), Some(AgeRange { low: 18, high: 18 }));
        assert_eq!(AgeRange::parse("18-25"), Some(AgeRange { low: 18, high: 25 }));
        assert_eq!(AgeRange::parse("18-"), None);
        assert_eq!(AgeRange::parse("abc"), None);
        assert_eq!(AgeRange::parse("+5"), None);
    }

    #[test]
    fn test_age_range_oversized_bounds_saturate() {
        assert_eq!(
            AgeRange::parse("18-99999999999"),
            Some(AgeRange {
                low: 18,
                high: u32::MAX
            })
        );

        let query = SearchQuery {
            age_range: Some("18-99999999999".to_string()),
            ..Default::default()
        };
        let filter = StoryFilter::from_query(&query);
        assert!(filter.matches(&story("Dhaka", 40, "Safe")));
        assert!(!filter.matches(&story("Dhaka", 17, "Safe")));

        // A single huge age is above every stored age
        let query = SearchQuery {
            age_range: Some("99999999999".to_string()),
            ..Default::default()
        };
        let filter = StoryFilter::from_query(&query);
        assert!(!filter.matches(&story("Dhaka", 17, "Safe")));
        assert!(!filter.matches(&story("Dhaka", 40, "Safe")));
    }

    #[test]
    fn test_inverted_age_range_matches_nothing() {
        let range = AgeRange::parse("30-20").unwrap();
        assert!(!range.contains(25));
        assert!(!range.contains(30));
        assert!(!range.contains(20));
    }

    #[test]
    fn test_filters_combine() {
        let query = SearchQuery {
            q: Some("SCHOOL".to_string()),
            location: Some("delhi".to_string()),
            age_range: Some("15-20".to_string()),
            ..Default::default()
        };
        let filter = StoryFilter::from_query(&query);

        assert!(filter.matches(&story("New Delhi", 17, "Back in school")));
        assert!(!filter.matches(&story("New Delhi", 22, "Back in school")));
        assert!(!filter.matches(&story("Kolkata", 17, "Back in school")));
        assert!(!filter.matches(&story("New Delhi", 17, "Working")));
    }

    #[test]
    fn test_empty_query_matches_all_capped() {
        let filter = StoryFilter::from_query(&SearchQuery::default());
        let stories = (0..150).map(|_| story("Lagos", 20, "Safe")).collect();
        assert_eq!(filter.apply(stories).len(), MAX_SEARCH_RESULTS);
    }
}
