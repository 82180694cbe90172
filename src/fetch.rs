//! Results-page transport.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: Core trait, one results page per call
//! - [`NaverFetcher`]: `reqwest` implementation against the news search listing
//! - [`RetryFetch`]: Decorator that adds retry logic to any [`PageFetcher`]
//!
//! # Retry Strategy
//!
//! - Exponential backoff from a base delay, capped at 5 seconds
//! - Random jitter (0-250ms) on every wait
//! - Status errors in the 4xx range other than 429 are not retried

use crate::config::SearchConfig;
use crate::error::FetchError;
use crate::models::DateRange;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Source of raw results-page markup.
pub trait PageFetcher {
    /// Fetch page `page` (1-based) of the results for `query` within `range`.
    async fn fetch_page(&self, query: &str, range: &DateRange, page: u32)
    -> Result<String, FetchError>;
}

/// Fetches the Naver news search listing, most recent first.
#[derive(Debug, Clone)]
pub struct NaverFetcher {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl NaverFetcher {
    pub fn new(config: &SearchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(referer) = HeaderValue::from_str(&config.referer) {
            headers.insert(REFERER, referer);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(StdDuration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(StdDuration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            page_size: config.page_size,
        })
    }

    /// Build the listing URL for one page.
    pub fn page_url(&self, query: &str, range: &DateRange, page: u32) -> Result<Url, FetchError> {
        let start_index = page.saturating_sub(1) * self.page_size + 1;
        let ds = range.start.format("%Y.%m.%d");
        let de = range.end.format("%Y.%m.%d");
        let nso = format!(
            "so:dd,p:from{}to{}",
            range.start.format("%Y%m%d"),
            range.end.format("%Y%m%d")
        );
        // Quoted for exact-phrase matching.
        let quoted = format!("\"{}\"", query);
        let raw = format!(
            "{}?where=news&query={}&sm=tab_pge&sort=1&photo=0&pd=3&ds={}&de={}&nso={}&start={}",
            self.base_url,
            urlencoding::encode(&quoted),
            ds,
            de,
            urlencoding::encode(&nso),
            start_index
        );
        Ok(Url::parse(&raw)?)
    }
}

impl PageFetcher for NaverFetcher {
    #[instrument(level = "info", skip(self, range))]
    async fn fetch_page(
        &self,
        query: &str,
        range: &DateRange,
        page: u32,
    ) -> Result<String, FetchError> {
        let url = self.page_url(query, range, page)?;
        debug!(%url, "Issuing GET for results page");

        let res = self.client.get(url.clone()).send().await?;
        let status = res.status();
        let ctype = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("<none>")
            .to_string();
        info!(%status, %ctype, "Results page response");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(res.text().await?)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageFetcher`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(5),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

fn is_retryable(e: &FetchError) -> bool {
    match e {
        FetchError::Status { status, .. } => *status == 429 || *status >= 500,
        FetchError::Url(_) => false,
        FetchError::Http(_) => true,
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self, range))]
    async fn fetch_page(
        &self,
        query: &str,
        range: &DateRange,
        page: u32,
    ) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch_page(query, range, page).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries || !is_retryable(&e) {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch_page() giving up"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch_page() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
