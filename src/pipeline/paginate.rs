//! Page-by-page collection for one search term.
//!
//! [`Paginator::run`] walks the listing one page at a time through
//! `Fetching -> Parsing -> Evaluating` until a stop condition holds:
//!
//! | Condition | [`StopReason`] |
//! |-----------|----------------|
//! | admitted records reached the quota | `QuotaReached` |
//! | page had no items (twice in a row in strict mode) | `EmptyPage` |
//! | configured page limit used up | `MaxPages` |
//! | newest item on the page predates the range (newest-first listings) | `DateBoundary` |
//! | caller cancelled | `Cancelled` |
//!
//! A failed fetch is logged and handled as a page without items. Pages are
//! fetched strictly in order, with a jittered pause between requests.

use crate::config::SearchConfig;
use crate::extract::{Extractor, PageExtraction};
use crate::fetch::PageFetcher;
use crate::models::{ArticleRecord, Category, DateRange};
use crate::pipeline::dedup::Deduplicator;
use chrono::{DateTime, FixedOffset};
use rand::{Rng, rng};
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Minimum pause between two page requests.
const PAGE_DELAY: StdDuration = StdDuration::from_millis(300);
const PAGE_DELAY_JITTER_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaReached,
    EmptyPage,
    MaxPages,
    DateBoundary,
    Cancelled,
}

/// What to collect for one term.
#[derive(Debug, Clone)]
pub struct TermPlan<'a> {
    pub query: &'a str,
    pub range: &'a DateRange,
    /// Maximum records to keep for this term.
    pub quota: usize,
    pub include_external_direct: bool,
}

/// Records collected for one term and why collection ended.
#[derive(Debug)]
pub struct TermOutcome {
    /// The term as it was sent to the fetcher.
    pub query: String,
    /// Admitted records in listing order.
    pub records: Vec<ArticleRecord>,
    /// Fetches that completed, failed ones included.
    pub pages_fetched: u32,
    pub stop: StopReason,
}

enum PageState {
    Fetching(u32),
    Parsing {
        page: u32,
        body: Option<String>,
    },
    Evaluating {
        page: u32,
        located: usize,
        newest: Option<DateTime<FixedOffset>>,
    },
    Terminated(StopReason),
}

/// Drives the page loop for one term at a time.
///
/// A single paginator can run several [`TermPlan`]s concurrently; each run
/// keeps its own dedup scope.
pub struct Paginator<'a, F> {
    fetcher: &'a F,
    extractor: &'a Extractor,
    config: &'a SearchConfig,
}

impl<'a, F> Paginator<'a, F>
where
    F: PageFetcher,
{
    /// Create a paginator.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of raw results pages
    /// * `extractor` - Turns a page into records
    /// * `config` - Page limit, empty-page policy and listing order
    pub fn new(fetcher: &'a F, extractor: &'a Extractor, config: &'a SearchConfig) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Collect records for `plan`, page by page, until a stop condition holds.
    ///
    /// # Arguments
    ///
    /// * `plan` - Term, date range, quota and external-record policy
    /// * `now` - Reference instant for relative timestamps
    /// * `cancel` - Checked before every fetch and during the pause between pages
    ///
    /// # Returns
    ///
    /// The admitted records and the [`StopReason`]. Cancellation is not an
    /// error: records admitted so far are returned.
    #[instrument(level = "info", skip_all, fields(query = %plan.query, quota = plan.quota))]
    pub async fn run(
        &self,
        plan: &TermPlan<'_>,
        now: DateTime<FixedOffset>,
        cancel: &CancellationToken,
    ) -> TermOutcome {
        let mut dedup = Deduplicator::new();
        let mut records: Vec<ArticleRecord> = Vec::new();
        let mut empty_streak = 0u32;
        let mut pages_fetched = 0u32;
        let mut state = PageState::Fetching(1);

        loop {
            state = match state {
                PageState::Fetching(page) => {
                    if page > 1 && !pace(cancel).await {
                        PageState::Terminated(StopReason::Cancelled)
                    } else {
                        let fetched = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            res = self.fetcher.fetch_page(plan.query, plan.range, page) => {
                                Some(res)
                            }
                        };
                        match fetched {
                            None => PageState::Terminated(StopReason::Cancelled),
                            Some(res) => {
                                pages_fetched += 1;
                                let body = match res {
                                    Ok(body) => Some(body),
                                    Err(e) => {
                                        warn!(
                                            page,
                                            error = %e,
                                            "Page fetch failed; treating as empty"
                                        );
                                        None
                                    }
                                };
                                PageState::Parsing { page, body }
                            }
                        }
                    }
                }
                PageState::Parsing { page, body } => {
                    let extraction = body
                        .map(|html| self.extractor.extract_page(&html, now))
                        .unwrap_or_default();
                    let located = extraction.located;
                    let newest = extraction
                        .records
                        .iter()
                        .filter_map(|r| r.normalized_time)
                        .max();
                    let admitted = admit_page(extraction, plan, &mut dedup, &mut records);
                    info!(page, located, admitted, total = records.len(), "Page processed");
                    PageState::Evaluating {
                        page,
                        located,
                        newest,
                    }
                }
                PageState::Evaluating {
                    page,
                    located,
                    newest,
                } => {
                    if located == 0 {
                        empty_streak += 1;
                    } else {
                        empty_streak = 0;
                    }
                    match self.stop_reason(plan, records.len(), page, empty_streak, newest) {
                        Some(reason) => PageState::Terminated(reason),
                        None => PageState::Fetching(page + 1),
                    }
                }
                PageState::Terminated(stop) => {
                    info!(?stop, pages_fetched, count = records.len(), "Term collection finished");
                    return TermOutcome {
                        query: plan.query.to_string(),
                        records,
                        pages_fetched,
                        stop,
                    };
                }
            };
        }
    }

    fn stop_reason(
        &self,
        plan: &TermPlan<'_>,
        collected: usize,
        page: u32,
        empty_streak: u32,
        newest: Option<DateTime<FixedOffset>>,
    ) -> Option<StopReason> {
        let empty_limit = if self.config.strict_empty_pages { 2 } else { 1 };
        if collected >= plan.quota {
            Some(StopReason::QuotaReached)
        } else if empty_streak >= empty_limit {
            Some(StopReason::EmptyPage)
        } else if page >= self.config.max_pages {
            Some(StopReason::MaxPages)
        } else if self.config.newest_first
            && newest.is_some_and(|t| plan.range.is_before_start(&t))
        {
            Some(StopReason::DateBoundary)
        } else {
            None
        }
    }
}

/// Dedup and filter one page into `records`. Returns how many were kept.
fn admit_page(
    extraction: PageExtraction,
    plan: &TermPlan<'_>,
    dedup: &mut Deduplicator,
    records: &mut Vec<ArticleRecord>,
) -> usize {
    let before = records.len();
    for record in extraction.records {
        if records.len() >= plan.quota {
            break;
        }
        if !dedup.admit(&record) {
            debug!(link = %record.canonical_link, "Dropping duplicate");
            continue;
        }
        if !plan.include_external_direct && record.category == Category::ExternalDirect {
            debug!(link = %record.canonical_link, "Dropping external record");
            continue;
        }
        if record
            .normalized_time
            .is_some_and(|t| plan.range.is_before_start(&t))
        {
            debug!(link = %record.canonical_link, "Dropping record older than range");
            continue;
        }
        records.push(record);
    }
    records.len() - before
}

/// Sleep between pages. Returns `false` if cancelled while waiting.
async fn pace(cancel: &CancellationToken) -> bool {
    let jitter_ms: u64 = rng().random_range(0..=PAGE_DELAY_JITTER_MS);
    let delay = PAGE_DELAY + StdDuration::from_millis(jitter_ms);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedFetcher, card, kst, page};
    use chrono::NaiveDate;

    fn config(max_pages: u32) -> SearchConfig {
        let mut config = SearchConfig::default();
        config.max_pages = max_pages;
        config.in_network_hosts = vec!["in.network.example".to_string()];
        config
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
    }

    fn cards(prefix: &str, n: usize, time: &str) -> Vec<String> {
        (0..n)
            .map(|i| {
                card(
                    &format!("{prefix} headline {i}"),
                    &format!("https://press.example/{prefix}/{i}"),
                    Some(&format!("https://in.network.example/{prefix}/{i}")),
                    "Example Daily",
                    time,
                )
            })
            .collect()
    }

    fn plan<'a>(range: &'a DateRange, quota: usize) -> TermPlan<'a> {
        TermPlan {
            query: "q",
            range,
            quota,
            include_external_direct: true,
        }
    }

    async fn run(
        fetcher: &ScriptedFetcher,
        config: &SearchConfig,
        plan: &TermPlan<'_>,
    ) -> TermOutcome {
        let extractor = Extractor::new(config);
        Paginator::new(fetcher, &extractor, config)
            .run(plan, kst(2024, 3, 10, 12), &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_stops_after_first_empty_page() {
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, page(&cards("p1", 3, "1시간 전")))
            .with_page("q", 2, "<html><body>검색결과가 없습니다</body></html>".to_string());
        let config = config(5);
        let range = range();
        let outcome = run(&fetcher, &config, &plan(&range, 50)).await;
        assert_eq!(outcome.stop, StopReason::EmptyPage);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(fetcher.requested("q"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_strict_mode_needs_two_empty_pages() {
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, page(&cards("p1", 2, "1시간 전")))
            .with_failure("q", 2)
            .with_page("q", 3, page(&cards("p3", 2, "2시간 전")));
        let mut config = config(6);
        config.strict_empty_pages = true;
        let range = range();
        let outcome = run(&fetcher, &config, &plan(&range, 50)).await;
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.stop, StopReason::EmptyPage);
        assert_eq!(fetcher.requested("q"), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_quota_caps_records_and_stops() {
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, page(&cards("p1", 4, "1시간 전")))
            .with_page("q", 2, page(&cards("p2", 4, "1시간 전")));
        let config = config(5);
        let range = range();
        let outcome = run(&fetcher, &config, &plan(&range, 6)).await;
        assert_eq!(outcome.stop, StopReason::QuotaReached);
        assert_eq!(outcome.records.len(), 6);
        assert_eq!(fetcher.requested("q"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_max_pages_bounds_the_walk() {
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, page(&cards("p1", 1, "1시간 전")))
            .with_page("q", 2, page(&cards("p2", 1, "1시간 전")))
            .with_page("q", 3, page(&cards("p3", 1, "1시간 전")));
        let config = config(2);
        let range = range();
        let outcome = run(&fetcher, &config, &plan(&range, 50)).await;
        assert_eq!(outcome.stop, StopReason::MaxPages);
        assert_eq!(fetcher.requested("q"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_date_boundary_prevents_fetching_page_four() {
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, page(&cards("p1", 2, "2시간 전")))
            .with_page("q", 2, page(&cards("p2", 2, "1일 전")))
            .with_page("q", 3, page(&cards("p3", 2, "2024.03.01.")))
            .with_page("q", 4, page(&cards("p4", 2, "2024.02.28.")));
        let config = config(10);
        let range = range();
        let outcome = run(&fetcher, &config, &plan(&range, 50)).await;
        assert_eq!(outcome.stop, StopReason::DateBoundary);
        assert_eq!(fetcher.requested("q"), vec![1, 2, 3]);
        assert_eq!(outcome.records.len(), 4);
    }

    #[tokio::test]
    async fn test_same_page_twice_is_idempotent() {
        let html = page(&cards("same", 3, "1시간 전"));
        let fetcher = ScriptedFetcher::new()
            .with_page("q", 1, html.clone())
            .with_page("q", 2, html);
        let config = config(2);
        let range = range();
        let twice = run(&fetcher, &config, &plan(&range, 50)).await;

        let once_fetcher =
            ScriptedFetcher::new().with_page("q", 1, page(&cards("same", 3, "1시간 전")));
        let once = run(&once_fetcher, &config, &plan(&range, 50)).await;
        assert_eq!(twice.records, once.records);
    }

    #[tokio::test]
    async fn test_excluded_external_records_do_not_use_quota() {
        let external = card("Outside", "https://press.example/x", None, "Other", "1시간 전");
        let mut first = vec![external];
        first.extend(cards("p1", 2, "1시간 전"));
        let fetcher = ScriptedFetcher::new().with_page("q", 1, page(&first));
        let config = config(1);
        let range = range();
        let plan = TermPlan {
            include_external_direct: false,
            ..plan(&range, 2)
        };
        let outcome = run(&fetcher, &config, &plan).await;
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.category == Category::InNetwork));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_returns_nothing() {
        let fetcher = ScriptedFetcher::new().with_page("q", 1, page(&cards("p1", 2, "1시간 전")));
        let config = config(3);
        let extractor = Extractor::new(&config);
        let range = range();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = Paginator::new(&fetcher, &extractor, &config)
            .run(&plan(&range, 10), kst(2024, 3, 10, 12), &cancel)
            .await;
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert!(outcome.records.is_empty());
        assert!(fetcher.requested("q").is_empty());
    }

    /// Fires the token when `cancel_on` is requested and never answers it.
    struct CancelOnPage {
        inner: ScriptedFetcher,
        cancel_on: u32,
        token: CancellationToken,
    }

    impl PageFetcher for CancelOnPage {
        async fn fetch_page(
            &self,
            query: &str,
            range: &DateRange,
            page: u32,
        ) -> Result<String, crate::error::FetchError> {
            if page == self.cancel_on {
                self.token.cancel();
                std::future::pending::<()>().await;
            }
            self.inner.fetch_page(query, range, page).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_mid_walk_keeps_earlier_pages() {
        let token = CancellationToken::new();
        let fetcher = CancelOnPage {
            inner: ScriptedFetcher::new()
                .with_page("q", 1, page(&cards("p1", 3, "1시간 전")))
                .with_page("q", 2, page(&cards("p2", 3, "1시간 전"))),
            cancel_on: 2,
            token: token.clone(),
        };
        let config = config(5);
        let extractor = Extractor::new(&config);
        let range = range();
        let outcome = Paginator::new(&fetcher, &extractor, &config)
            .run(&plan(&range, 50), kst(2024, 3, 10, 12), &token)
            .await;

        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert_eq!(outcome.pages_fetched, 1);
        let titles: Vec<_> = outcome.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["p1 headline 0", "p1 headline 1", "p1 headline 2"]);
        assert_eq!(fetcher.inner.requested("q"), vec![1]);
    }
}
