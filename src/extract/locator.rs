//! Item location on a results page.
//!
//! The listing has shipped several layouts. [`ItemLocator`] tries one
//! structural query per layout, in order, and keeps the first that matches
//! anything. An unparsable selector counts as a query with no matches.

use crate::config::SearchConfig;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

/// One candidate article block on a page.
#[derive(Debug, Clone, Copy)]
pub struct ItemRegion<'a> {
    pub element: ElementRef<'a>,
    /// Title anchor already identified by the query, if any.
    pub anchor: Option<ElementRef<'a>>,
}

#[derive(Debug)]
enum LocatorQuery {
    /// Every element matching the selector is an item.
    Container {
        name: &'static str,
        selector: Option<Selector>,
    },
    /// Title anchors walked upward until an ancestor holds a byline marker.
    AnchorWalk {
        anchor: Option<Selector>,
        marker: Option<Selector>,
        max_depth: usize,
    },
}

#[derive(Debug)]
pub struct ItemLocator {
    queries: Vec<LocatorQuery>,
}

impl ItemLocator {
    pub fn new(config: &SearchConfig) -> Self {
        let s = &config.selectors;
        let mut queries = Vec::new();
        for css in &s.list_items {
            queries.push(LocatorQuery::Container {
                name: "list_item",
                selector: parse_selector(css),
            });
        }
        for css in &s.item_containers {
            queries.push(LocatorQuery::Container {
                name: "item_container",
                selector: parse_selector(css),
            });
        }
        queries.push(LocatorQuery::AnchorWalk {
            anchor: parse_selector(&s.heatmap_anchor),
            marker: parse_selector(&s.profile_marker),
            max_depth: s.max_ancestor_depth,
        });
        Self { queries }
    }

    /// Item regions of the first query that matches, in document order.
    pub fn locate<'a>(&self, document: &'a Html) -> Vec<ItemRegion<'a>> {
        for (index, query) in self.queries.iter().enumerate() {
            let regions = dedup_by_node(run_query(query, document));
            if !regions.is_empty() {
                debug!(query = index, count = regions.len(), "Item query matched");
                return regions;
            }
        }
        debug!("No item query matched");
        Vec::new()
    }
}

fn run_query<'a>(query: &LocatorQuery, document: &'a Html) -> Vec<ItemRegion<'a>> {
    match query {
        LocatorQuery::Container { name, selector } => {
            let Some(selector) = selector else {
                debug!(query = *name, "Skipping unparsable container query");
                return Vec::new();
            };
            document
                .select(selector)
                .map(|element| ItemRegion {
                    element,
                    anchor: None,
                })
                .collect()
        }
        LocatorQuery::AnchorWalk {
            anchor,
            marker,
            max_depth,
        } => {
            let (Some(anchor), Some(marker)) = (anchor, marker) else {
                return Vec::new();
            };
            document
                .select(anchor)
                .map(|a| ItemRegion {
                    element: enclosing_card(a, marker, *max_depth).unwrap_or(a),
                    anchor: Some(a),
                })
                .collect()
        }
    }
}

/// Nearest ancestor within `max_depth` levels that contains a `marker` element.
fn enclosing_card<'a>(
    anchor: ElementRef<'a>,
    marker: &Selector,
    max_depth: usize,
) -> Option<ElementRef<'a>> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(max_depth)
        .find(|ancestor| ancestor.select(marker).next().is_some())
}

fn dedup_by_node(regions: Vec<ItemRegion<'_>>) -> Vec<ItemRegion<'_>> {
    let mut seen = HashSet::new();
    regions
        .into_iter()
        .filter(|r| seen.insert(r.element.id()))
        .collect()
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = css, error = ?e, "Invalid selector; treating as no match");
            None
        }
    }
}

/// Compile a selector chain, dropping entries that fail to parse.
pub fn compile_selectors(chain: &[String]) -> Vec<Selector> {
    chain.iter().filter_map(|css| parse_selector(css)).collect()
}
