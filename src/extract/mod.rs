//! Listing extraction: from one results page to article records.
//!
//! # Submodules
//!
//! - [`locator`]: Finds the item regions on a page
//! - [`resolver`]: Resolves each field of an item through fallback chains
//! - [`timestamp`]: Normalizes time text into an instant
//!
//! [`Extractor::extract_page`] runs all three over raw markup. Items with
//! neither a title nor a link are dropped here; every other item becomes a
//! record, however incomplete.

pub mod locator;
pub mod resolver;
pub mod timestamp;

use crate::config::SearchConfig;
use crate::models::ArticleRecord;
use crate::utils::truncate_for_log;
use chrono::{DateTime, FixedOffset};
use locator::ItemLocator;
use resolver::FieldResolver;
use scraper::Html;
use tracing::{debug, instrument};

/// Records pulled from one page, plus how many items were located.
#[derive(Debug, Default)]
pub struct PageExtraction {
    /// Item regions found, including blanks that produced no record.
    pub located: usize,
    pub records: Vec<ArticleRecord>,
}

#[derive(Debug)]
pub struct Extractor {
    locator: ItemLocator,
    resolver: FieldResolver,
}

impl Extractor {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            locator: ItemLocator::new(config),
            resolver: FieldResolver::new(config),
        }
    }

    #[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
    pub fn extract_page(&self, html: &str, now: DateTime<FixedOffset>) -> PageExtraction {
        let document = Html::parse_document(html);
        let regions = self.locator.locate(&document);
        let located = regions.len();
        if located == 0 {
            debug!(preview = %truncate_for_log(html, 200), "No item regions located");
        }

        let records = regions
            .iter()
            .map(|region| self.resolver.resolve(region))
            .filter(|fields| {
                if fields.is_blank() {
                    debug!("Skipping item without title or link");
                }
                !fields.is_blank()
            })
            .map(|fields| {
                let normalized = timestamp::normalize(&fields.timestamp_text, now);
                fields.into_record(normalized)
            })
            .collect();

        PageExtraction { located, records }
    }
}
