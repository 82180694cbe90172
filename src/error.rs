//! Typed errors for the scrap pipeline.
//!
//! Only [`SearchError`] ever reaches a caller of [`crate::search::search`].
//! Transport failures ([`FetchError`]) are absorbed by the pagination loop and
//! show up as empty pages in the logs.

use thiserror::Error;

/// Invalid parameters handed to [`crate::search::search`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("at least one search term is required")]
    NoTerms,

    #[error("search term #{index} is blank")]
    BlankTerm { index: usize },

    #[error("max_articles must be greater than zero")]
    ZeroMaxArticles,

    #[error("date range starts ({start}) after it ends ({end})")]
    InvertedDateRange { start: String, end: String },
}

/// Failure to obtain one results page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Problems loading or validating a [`crate::config::SearchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
