//! Data models for extracted article records and search requests.
//!
//! # Types
//!
//! - [`ArticleRecord`]: One listing entry extracted from a results page
//! - [`Category`]: Output group a record is filed under
//! - [`DateRange`]: Inclusive calendar range a search is restricted to
//! - [`SearchRequest`]: Parameters for [`crate::search::search`]

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Source label used when no outlet name could be resolved.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Rank given to records whose query term is missing from the priority table.
pub const DEFAULT_PRIORITY: i32 = i32::MAX;

/// Output group for a record. Variants are declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Appeared in a paginated print edition.
    PrintEdition,
    /// Has a mirror on the search provider's own news host.
    InNetwork,
    /// Only reachable through the publisher's own link.
    ExternalDirect,
}

impl Category {
    /// All categories in display order.
    pub const ORDERED: [Category; 3] = [
        Category::PrintEdition,
        Category::InNetwork,
        Category::ExternalDirect,
    ];

    /// Heading used when rendering a group of records.
    pub fn label(self) -> &'static str {
        match self {
            Category::PrintEdition => "지면 기사",
            Category::InNetwork => "네이버 뉴스",
            Category::ExternalDirect => "언론사 직접",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single article listing, normalized and classified.
///
/// Records are built by the extraction stage and are not modified afterwards,
/// except for the query tag attached by [`ArticleRecord::tagged`] when several
/// terms are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Display title, with the edition label appended for print-edition items.
    pub title: String,
    /// In-network mirror when one was found, otherwise the listed link.
    pub canonical_link: String,
    /// Link as first listed on the results page.
    pub original_link: String,
    /// Outlet name, or [`UNKNOWN_SOURCE`].
    pub source_name: String,
    /// Raw time text as shown in the listing; empty when none was found.
    pub timestamp_text: String,
    /// `timestamp_text` as an instant, `None` when it could not be read.
    pub normalized_time: Option<DateTime<FixedOffset>>,
    pub is_in_network: bool,
    pub is_print_edition: bool,
    pub category: Category,
    /// Search term that produced the record; set only when terms are merged.
    pub source_query_term: Option<String>,
    /// Rank of the producing term, lower first.
    pub priority_rank: i32,
}

impl ArticleRecord {
    /// Attach the query term that produced this record and its rank.
    pub fn tagged(mut self, term: &str, priority_rank: i32) -> Self {
        self.source_query_term = Some(term.to_string());
        self.priority_rank = priority_rank;
        self
    }
}

/// Inclusive date range, in the result provider's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// True when `instant` falls on a day before the range starts.
    pub fn is_before_start(&self, instant: &DateTime<FixedOffset>) -> bool {
        instant.date_naive() < self.start
    }
}

/// Parameters for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Search terms, each paged independently.
    pub terms: Vec<String>,
    pub date_range: DateRange,
    /// Upper bound on records returned overall.
    pub max_articles: usize,
    /// Lower rank is shown first. Terms missing here get [`DEFAULT_PRIORITY`].
    /// Keys are compared with surrounding whitespace removed.
    pub term_priority: HashMap<String, i32>,
    /// Keep records only reachable through the publisher's own link.
    pub include_external_direct: bool,
}

impl SearchRequest {
    /// Rank of `term`, ignoring surrounding whitespace on both sides.
    ///
    /// # Returns
    ///
    /// The configured rank, or [`DEFAULT_PRIORITY`] for unknown terms.
    pub fn priority_of(&self, term: &str) -> i32 {
        let term = term.trim();
        self.term_priority
            .iter()
            .find(|(key, _)| key.trim() == term)
            .map(|(_, rank)| *rank)
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// The priority table keyed by trimmed term.
    pub fn term_ranks(&self) -> HashMap<String, i32> {
        self.term_priority
            .iter()
            .map(|(key, rank)| (key.trim().to_string(), *rank))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> ArticleRecord {
        ArticleRecord {
            title: "Station Safety Drill Held".to_string(),
            canonical_link: "https://press.example/a1".to_string(),
            original_link: "https://press.example/a1".to_string(),
            source_name: "Example Daily".to_string(),
            timestamp_text: "2024.03.02.".to_string(),
            normalized_time: None,
            is_in_network: false,
            is_print_edition: false,
            category: Category::ExternalDirect,
            source_query_term: None,
            priority_rank: DEFAULT_PRIORITY,
        }
    }

    #[test]
    fn test_category_display_order() {
        let mut shuffled = vec![
            Category::ExternalDirect,
            Category::PrintEdition,
            Category::InNetwork,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Category::ORDERED.to_vec());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::InNetwork).unwrap();
        assert_eq!(json, "\"in_network\"");
    }

    #[test]
    fn test_tagged_sets_term_and_rank() {
        let tagged = record().tagged("A", 0);
        assert_eq!(tagged.source_query_term.as_deref(), Some("A"));
        assert_eq!(tagged.priority_rank, 0);
    }

    #[test]
    fn test_date_range_is_before_start() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        );
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let before = kst.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let inside = kst.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert!(range.is_before_start(&before));
        assert!(!range.is_before_start(&inside));
    }

    #[test]
    fn test_priority_of_unknown_term_is_lowest() {
        let request = SearchRequest {
            terms: vec!["A".to_string()],
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            ),
            max_articles: 10,
            term_priority: HashMap::from([("A".to_string(), 0)]),
            include_external_direct: true,
        };
        assert_eq!(request.priority_of("A"), 0);
        assert_eq!(request.priority_of("B"), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_priority_keys_ignore_surrounding_whitespace() {
        let request = SearchRequest {
            terms: vec!["A".to_string()],
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            ),
            max_articles: 10,
            term_priority: HashMap::from([(" A ".to_string(), 0)]),
            include_external_direct: true,
        };
        assert_eq!(request.priority_of("A"), 0);
        assert_eq!(request.priority_of(" A"), 0);
        assert_eq!(request.term_ranks().get("A"), Some(&0));
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let json = serde_json::to_string(&record()).unwrap();
        let back: ArticleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record());
    }
}
