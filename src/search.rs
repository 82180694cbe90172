//! Public search entry point.
//!
//! [`search`] validates the request, runs one [`Paginator`] per term (terms
//! run concurrently, each with its own dedup scope) and merges the results
//! when more than one term is active. Transport and parsing problems never
//! surface here; only invalid parameters do.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::extract::Extractor;
use crate::fetch::PageFetcher;
use crate::models::{ArticleRecord, SearchRequest};
use crate::pipeline::merge::{merge, term_quota};
use crate::pipeline::paginate::{Paginator, TermPlan};
use chrono::{DateTime, FixedOffset};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

fn validate(request: &SearchRequest) -> Result<(), SearchError> {
    if request.terms.is_empty() {
        return Err(SearchError::NoTerms);
    }
    if let Some(index) = request.terms.iter().position(|t| t.trim().is_empty()) {
        return Err(SearchError::BlankTerm { index });
    }
    if request.max_articles == 0 {
        return Err(SearchError::ZeroMaxArticles);
    }
    let range = &request.date_range;
    if range.start > range.end {
        return Err(SearchError::InvertedDateRange {
            start: range.start.to_string(),
            end: range.end.to_string(),
        });
    }
    Ok(())
}

/// Collect, classify and rank articles for every term in `request`.
///
/// On cancellation, whatever was collected up to that point is returned.
#[instrument(
    level = "info",
    skip_all,
    fields(terms = ?request.terms, max_articles = request.max_articles)
)]
pub async fn search<F>(
    fetcher: &F,
    request: &SearchRequest,
    config: &SearchConfig,
    now: DateTime<FixedOffset>,
    cancel: &CancellationToken,
) -> Result<Vec<ArticleRecord>, SearchError>
where
    F: PageFetcher,
{
    validate(request)?;

    let extractor = Extractor::new(config);
    let paginator = Paginator::new(fetcher, &extractor, config);
    let quota = term_quota(
        request.max_articles,
        request.terms.len(),
        config.multi_term_quota_ratio,
    );
    let plans: Vec<TermPlan<'_>> = request
        .terms
        .iter()
        .map(|term| TermPlan {
            query: term.trim(),
            range: &request.date_range,
            quota,
            include_external_direct: request.include_external_direct,
        })
        .collect();

    let outcomes = join_all(plans.iter().map(|plan| paginator.run(plan, now, cancel))).await;
    for outcome in &outcomes {
        info!(
            query = %outcome.query,
            count = outcome.records.len(),
            pages = outcome.pages_fetched,
            stop = ?outcome.stop,
            "Term finished"
        );
    }

    let records = if outcomes.len() > 1 {
        let per_term = outcomes
            .into_iter()
            .map(|o| (o.query, o.records))
            .collect();
        merge(per_term, request.max_articles, &request.term_ranks())
    } else {
        // A lone term keeps document order; only its rank is stamped.
        outcomes
            .into_iter()
            .flat_map(|o| {
                let rank = request.priority_of(&o.query);
                o.records.into_iter().map(move |mut r| {
                    r.priority_rank = rank;
                    r
                })
            })
            .collect()
    };

    info!(count = records.len(), "Search complete");
    Ok(records)
}
