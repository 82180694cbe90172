//! # News Scrap
//!
//! Extraction and classification pipeline for news search-result listings.
//!
//! Result pages change their markup often, so every step works from ordered
//! fallback strategies and degrades to partial records instead of failing.
//!
//! ## Architecture
//!
//! 1. **Fetching**: a [`fetch::PageFetcher`] supplies one results page at a time
//! 2. **Extraction**: [`extract`] locates item regions, resolves their fields
//!    and normalizes timestamps
//! 3. **Pipeline**: [`pipeline`] deduplicates, classifies, paginates and,
//!    for several terms, merges
//! 4. **Output**: [`outputs`] renders scrap reports and JSON files
//!
//! [`search::search`] ties the stages together.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod search;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{ConfigError, FetchError, SearchError};
pub use models::{ArticleRecord, Category, DateRange, SearchRequest};
pub use search::search;
