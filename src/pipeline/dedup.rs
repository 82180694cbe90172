//! Duplicate suppression within one search invocation.
//!
//! Two identities are tracked: links (canonical and as first listed) and the
//! `(title, source)` pair with all whitespace removed. Matching either one
//! makes a record a duplicate. The caller owns the instance and decides how
//! long it lives.

use crate::models::ArticleRecord;
use std::collections::HashSet;

/// Seen-set of link and `(title, source)` identities.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    links: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl Deduplicator {
    /// Create an empty deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `record` as seen.
    ///
    /// Non-empty canonical and original links both join the link set, so a
    /// later record listing either one is rejected.
    ///
    /// # Returns
    ///
    /// `true` if the record is new, `false` if any identity was already seen.
    /// A rejected record leaves the seen-sets unchanged.
    pub fn admit(&mut self, record: &ArticleRecord) -> bool {
        let pair = pair_key(record);
        let seen_link = [&record.canonical_link, &record.original_link]
            .into_iter()
            .any(|link| !link.is_empty() && self.links.contains(link));
        if seen_link || self.pairs.contains(&pair) {
            return false;
        }
        for link in [&record.canonical_link, &record.original_link] {
            if !link.is_empty() {
                self.links.insert(link.clone());
            }
        }
        self.pairs.insert(pair);
        true
    }

    /// Number of admitted records.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn pair_key(record: &ArticleRecord) -> (String, String) {
    (strip_ws(&record.title), strip_ws(&record.source_name))
}

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
