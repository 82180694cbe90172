//! Shared fixtures for unit tests.

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::models::{ArticleRecord, Category, DEFAULT_PRIORITY, DateRange};
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn kst(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .unwrap()
}

/// External record with the given title, source and link.
pub fn record(title: &str, source: &str, link: &str) -> ArticleRecord {
    ArticleRecord {
        title: title.to_string(),
        canonical_link: link.to_string(),
        original_link: link.to_string(),
        source_name: source.to_string(),
        timestamp_text: String::new(),
        normalized_time: None,
        is_in_network: false,
        is_print_edition: false,
        category: Category::ExternalDirect,
        source_query_term: None,
        priority_rank: DEFAULT_PRIORITY,
    }
}

/// One listing card in the current profile-based layout.
pub fn card(title: &str, link: &str, mirror: Option<&str>, source: &str, time: &str) -> String {
    let mirror = mirror
        .map(|m| format!(r#"<a href="{m}">네이버뉴스</a>"#))
        .unwrap_or_default();
    format!(
        r#"<div class="sds-comps-vertical-layout">
             <div class="sds-comps-profile">
               <span class="sds-comps-profile-info-title-text">{source}</span>
               <span class="sds-comps-profile-info-subtexts"><span>{time}</span>{mirror}</span>
             </div>
             <a data-heatmap-target=".tit" href="{link}">{title}</a>
           </div>"#
    )
}

/// A results page wrapping `cards`.
pub fn page(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"api_subject_bx\">{}</div></body></html>",
        cards.concat()
    )
}

/// In-memory [`PageFetcher`] serving scripted pages per query.
///
/// Pages not scripted come back as an empty document; `None` entries fail
/// with a 503.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: HashMap<(String, u32), Option<String>>,
    requested: Mutex<Vec<(String, u32)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, query: &str, page: u32, html: String) -> Self {
        self.pages.insert((query.to_string(), page), Some(html));
        self
    }

    pub fn with_failure(mut self, query: &str, page: u32) -> Self {
        self.pages.insert((query.to_string(), page), None);
        self
    }

    /// Pages requested for `query`, in request order.
    pub fn requested(&self, query: &str) -> Vec<u32> {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q == query)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(
        &self,
        query: &str,
        _range: &DateRange,
        page: u32,
    ) -> Result<String, FetchError> {
        self.requested
            .lock()
            .unwrap()
            .push((query.to_string(), page));
        match self.pages.get(&(query.to_string(), page)) {
            Some(Some(html)) => Ok(html.clone()),
            Some(None) => Err(FetchError::Status {
                status: 503,
                url: format!("https://search.example/?q={query}&page={page}"),
            }),
            None => Ok("<html><body></body></html>".to_string()),
        }
    }
}
