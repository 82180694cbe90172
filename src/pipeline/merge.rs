//! Merging per-term result sets.
//!
//! Every term runs with its own quota and dedup scope, so the same article can
//! show up under several terms. [`merge`] removes those repeats (the
//! higher-priority term keeps the record), orders by priority then recency,
//! and truncates to the overall quota.

use crate::models::{ArticleRecord, DEFAULT_PRIORITY};
use crate::pipeline::dedup::Deduplicator;
use itertools::Itertools;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use tracing::debug;

/// Per-term quota: the whole quota for a single term, a reduced share otherwise.
///
/// # Arguments
///
/// * `total` - Overall article limit of the search
/// * `term_count` - Number of terms running
/// * `ratio` - Share of `total` each term may collect when several run
///
/// # Returns
///
/// `ceil(total * ratio)`, kept within `1..=total`.
pub fn term_quota(total: usize, term_count: usize, ratio: f64) -> usize {
    if term_count <= 1 || total == 0 {
        return total;
    }
    ((total as f64 * ratio).ceil() as usize).clamp(1, total)
}

/// Merge `(term, records)` sets into one list of at most `quota_total`.
///
/// Each record is tagged with its term and the term's rank from
/// `term_priority`; terms missing from the table rank last.
///
/// # Arguments
///
/// * `per_term` - Records collected by each term, in listing order
/// * `quota_total` - Maximum records to return
/// * `term_priority` - Term to rank table, lower first
///
/// # Returns
///
/// Unique records ordered by rank, then newest first, undated last.
pub fn merge(
    per_term: Vec<(String, Vec<ArticleRecord>)>,
    quota_total: usize,
    term_priority: &HashMap<String, i32>,
) -> Vec<ArticleRecord> {
    let combined: Vec<ArticleRecord> = per_term
        .into_iter()
        .flat_map(|(term, records)| {
            let rank = term_priority.get(&term).copied().unwrap_or(DEFAULT_PRIORITY);
            records
                .into_iter()
                .map(move |r| r.tagged(&term, rank))
                .collect::<Vec<_>>()
        })
        .sorted_by_key(|r| r.priority_rank)
        .collect();
    let before = combined.len();

    let mut dedup = Deduplicator::new();
    let mut merged: Vec<ArticleRecord> = combined
        .into_iter()
        .filter(|r| dedup.admit(r))
        .sorted_by(display_order)
        .collect();

    debug!(
        before,
        unique = merged.len(),
        quota_total,
        "Merged per-term results"
    );
    merged.truncate(quota_total);
    merged
}

/// Priority ascending, then newest first; undated records last.
fn display_order(a: &ArticleRecord, b: &ArticleRecord) -> Ordering {
    a.priority_rank.cmp(&b.priority_rank).then_with(|| {
        match (a.normalized_time, b.normalized_time) {
            (Some(x), Some(y)) => Reverse(x).cmp(&Reverse(y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{kst, record};

    fn term_records(term: &str, n: u32) -> (String, Vec<ArticleRecord>) {
        let records = (0..n)
            .map(|i| {
                let mut r = record(
                    &format!("{term} story {i}"),
                    "Example Daily",
                    &format!("https://press.example/{term}/{i}"),
                );
                r.normalized_time = Some(kst(2024, 3, 1 + i, 9));
                r
            })
            .collect();
        (term.to_string(), records)
    }

    fn priorities() -> HashMap<String, i32> {
        HashMap::from([("A".to_string(), 0), ("B".to_string(), 1)])
    }

    #[test]
    fn test_term_quota() {
        assert_eq!(term_quota(10, 1, 0.6), 10);
        assert_eq!(term_quota(10, 2, 0.6), 6);
        assert_eq!(term_quota(7, 3, 0.6), 5);
        assert_eq!(term_quota(1, 4, 0.1), 1);
    }

    #[test]
    fn test_priority_then_recency() {
        let merged = merge(
            vec![term_records("B", 8), term_records("A", 8)],
            10,
            &priorities(),
        );
        assert_eq!(merged.len(), 10);
        let first_b = merged.iter().position(|r| r.priority_rank == 1).unwrap();
        assert!(merged[..first_b].iter().all(|r| r.priority_rank == 0));
        assert!(merged[first_b..].iter().all(|r| r.priority_rank == 1));
        for group in [&merged[..first_b], &merged[first_b..]] {
            assert!(
                group
                    .windows(2)
                    .all(|w| w[0].normalized_time >= w[1].normalized_time)
            );
        }
    }

    #[test]
    fn test_cross_term_duplicates_keep_higher_priority() {
        let shared = record("Shared", "Example Daily", "https://press.example/shared");
        let merged = merge(
            vec![
                ("B".to_string(), vec![shared.clone()]),
                ("A".to_string(), vec![shared]),
            ],
            10,
            &priorities(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_query_term.as_deref(), Some("A"));
    }

    #[test]
    fn test_undated_records_sort_last_and_unknown_terms_rank_last() {
        let undated = record("Undated", "P", "https://a/1");
        let mut dated = record("Dated", "P", "https://a/2");
        dated.normalized_time = Some(kst(2024, 1, 1, 0));
        let mut unknown = record("Unknown", "P", "https://a/3");
        unknown.normalized_time = Some(kst(2024, 3, 1, 0));

        let merged = merge(
            vec![
                ("Z".to_string(), vec![unknown]),
                ("A".to_string(), vec![undated, dated]),
            ],
            10,
            &priorities(),
        );
        let titles: Vec<_> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Dated", "Undated", "Unknown"]);
        assert_eq!(merged[2].priority_rank, DEFAULT_PRIORITY);
    }
}
