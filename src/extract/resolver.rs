//! Field resolution for a single located item.
//!
//! Each logical field has an ordered chain of strategies. A strategy looks at
//! the item region and returns `Some(value)` when it recognizes its markup
//! variant; the first hit wins. Resolution never fails: an exhausted chain
//! leaves the field at its default.
//!
//! | Field | Chain |
//! |-------|-------|
//! | title | anchor `title` attribute, anchor text |
//! | link | anchor `href` |
//! | source | configured source selectors, then [`UNKNOWN_SOURCE`] |
//! | canonical link | in-network anchor in the region, then the listed link |
//! | timestamp | subtext blocks, then every text node in the region |
//! | print edition | edition token anywhere in the region text |

use super::locator::{ItemRegion, compile_selectors};
use crate::config::SearchConfig;
use crate::extract::timestamp::looks_relative;
use crate::models::{ArticleRecord, DEFAULT_PRIORITY, UNKNOWN_SOURCE};
use crate::pipeline::classify::category_for;
use crate::utils::clean;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

/// Timestamp candidates at or beyond this many characters are sentences, not times.
const MAX_TIMESTAMP_CHARS: usize = 15;

const DATE_SEPARATORS: [char; 3] = ['.', '-', '/'];

/// Page/section letters, page number, then the `면` (page) marker.
static EDITION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z가-힣]{0,4}\d{1,3}면$").unwrap());

type TitleStrategy = fn(ElementRef<'_>) -> Option<String>;

/// Title strategies, tagged for logging.
const TITLE_STRATEGIES: &[(&str, TitleStrategy)] = &[
    ("title_attr", title_from_attr),
    ("anchor_text", title_from_text),
];

fn title_from_attr(anchor: ElementRef<'_>) -> Option<String> {
    non_empty(anchor.value().attr("title").map(clean))
}

fn title_from_text(anchor: ElementRef<'_>) -> Option<String> {
    non_empty(Some(clean(&anchor.text().collect::<String>())))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Field values resolved from one item region, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub title: String,
    pub original_link: String,
    pub canonical_link: String,
    pub source_name: String,
    pub timestamp_text: String,
    pub is_in_network: bool,
    pub is_print_edition: bool,
}

impl ResolvedFields {
    /// Nothing article-like was found in the region.
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.original_link.is_empty()
    }

    /// Finish the record with its normalized time and category.
    pub fn into_record(self, normalized_time: Option<DateTime<FixedOffset>>) -> ArticleRecord {
        let category = category_for(self.is_print_edition, self.is_in_network);
        ArticleRecord {
            title: self.title,
            canonical_link: self.canonical_link,
            original_link: self.original_link,
            source_name: self.source_name,
            timestamp_text: self.timestamp_text,
            normalized_time,
            is_in_network: self.is_in_network,
            is_print_edition: self.is_print_edition,
            category,
            source_query_term: None,
            priority_rank: DEFAULT_PRIORITY,
        }
    }
}

/// Resolves [`ResolvedFields`] from item regions using configured selector chains.
#[derive(Debug)]
pub struct FieldResolver {
    title_anchor: Vec<Selector>,
    source: Vec<Selector>,
    subtext: Vec<Selector>,
    any_link: Selector,
    in_network_hosts: Vec<String>,
    edition_label: String,
}

impl FieldResolver {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            title_anchor: compile_selectors(&config.selectors.title_anchor),
            source: compile_selectors(&config.selectors.source),
            subtext: compile_selectors(&config.selectors.subtext),
            any_link: Selector::parse("a[href]").unwrap(),
            in_network_hosts: config
                .in_network_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            edition_label: config.edition_label.clone(),
        }
    }

    pub fn resolve(&self, region: &ItemRegion<'_>) -> ResolvedFields {
        let anchor = region.anchor.or_else(|| self.find_anchor(region.element));

        let mut title = anchor.and_then(resolve_title).unwrap_or_default();
        let original_link = anchor
            .and_then(|a| a.value().attr("href"))
            .map(|h| h.trim().to_string())
            .unwrap_or_default();

        let (canonical_link, is_in_network) = match self.in_network_link(region.element) {
            Some(mirror) => (mirror, true),
            None => {
                let listed_in_network = self.is_in_network(&original_link);
                (original_link.clone(), listed_in_network)
            }
        };

        let source_name = self
            .source_name(region.element)
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let timestamp_text = self.timestamp_text(region.element).unwrap_or_default();

        let is_print_edition = has_edition_token(region.element);
        if is_print_edition && !title.ends_with(&self.edition_label) {
            title = format!("{} {}", title, self.edition_label);
        }

        debug!(
            %title,
            %canonical_link,
            %source_name,
            %timestamp_text,
            is_in_network,
            is_print_edition,
            "Resolved item fields"
        );

        ResolvedFields {
            title,
            original_link,
            canonical_link,
            source_name,
            timestamp_text,
            is_in_network,
            is_print_edition,
        }
    }

    fn find_anchor<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.title_anchor
            .iter()
            .find_map(|sel| element.select(sel).next())
    }

    /// Whether `link` points at one of the in-network hosts.
    pub fn is_in_network(&self, link: &str) -> bool {
        let Ok(url) = Url::parse(link) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.in_network_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }

    fn in_network_link(&self, element: ElementRef<'_>) -> Option<String> {
        element
            .select(&self.any_link)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| self.is_in_network(href))
            .map(str::to_string)
    }

    fn source_name(&self, element: ElementRef<'_>) -> Option<String> {
        self.source.iter().find_map(|sel| {
            element
                .select(sel)
                .map(|el| clean(&el.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
    }

    fn timestamp_text(&self, element: ElementRef<'_>) -> Option<String> {
        self.subtext
            .iter()
            .flat_map(|sel| element.select(sel))
            .find_map(first_time_like)
            .or_else(|| first_time_like(element))
    }
}

fn resolve_title(anchor: ElementRef<'_>) -> Option<String> {
    TITLE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let title = strategy(anchor)?;
        debug!(strategy = name, "Title resolved");
        Some(title)
    })
}

/// First text node under `element` shaped like a relative age or a date.
fn first_time_like(element: ElementRef<'_>) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|text| is_time_like(text))
        .map(str::to_string)
}

fn is_time_like(text: &str) -> bool {
    let len = text.chars().count();
    if text.is_empty() || len >= MAX_TIMESTAMP_CHARS {
        return false;
    }
    let relative = looks_relative(text) || looks_like_age(text);
    let dated = text.starts_with(|c: char| c.is_ascii_digit()) && text.contains(DATE_SEPARATORS);
    relative || dated
}

/// Count followed by any unit and an "ago" marker ("1개월 전", "2 months ago").
///
/// Units the normalizer does not know still count as a timestamp here.
fn looks_like_age(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit())
        && (text.contains('전') || text.to_ascii_lowercase().contains("ago"))
}

fn has_edition_token(element: ElementRef<'_>) -> bool {
    element
        .text()
        .flat_map(str::split_whitespace)
        .any(|token| EDITION_TOKEN.is_match(token))
}
