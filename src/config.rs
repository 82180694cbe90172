//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! configuration tuned for the Naver news search listing. Selector lists are
//! ordered: earlier entries are tried first.
//!
//! ```yaml
//! max_pages: 5
//! strict_empty_pages: true
//! in_network_hosts:
//!   - n.news.naver.com
//! selectors:
//!   source:
//!     - .sds-comps-profile-info-title-text
//!     - .press_name
//! ```

use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint the listing is requested from.
    pub base_url: String,
    /// Browser user agent sent with every request.
    pub user_agent: String,
    /// `Referer` header sent with every request.
    pub referer: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries per page after the first attempt.
    pub max_retries: usize,
    /// Results per listing page; drives the `start` offset.
    pub page_size: u32,
    /// Upper bound on pages fetched per term.
    pub max_pages: u32,
    /// Require two consecutive pages without items before stopping.
    pub strict_empty_pages: bool,
    /// The provider lists results most recent first.
    pub newest_first: bool,
    /// Share of `max_articles` each term may contribute when several terms run.
    pub multi_term_quota_ratio: f64,
    /// Hosts (and their subdomains) that count as in-network mirrors.
    pub in_network_hosts: Vec<String>,
    /// Appended to the title of print-edition records.
    pub edition_label: String,
    /// Markup selector chains.
    pub selectors: SelectorConfig,
    /// Extra non-business days for the report header.
    pub holidays: Vec<NaiveDate>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://search.naver.com/search.naver".to_string(),
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
            referer: "https://www.naver.com/".to_string(),
            request_timeout_secs: 10,
            max_retries: 2,
            page_size: 10,
            max_pages: 3,
            strict_empty_pages: false,
            newest_first: true,
            multi_term_quota_ratio: 0.6,
            in_network_hosts: vec!["n.news.naver.com".to_string()],
            edition_label: "(지면)".to_string(),
            selectors: SelectorConfig::default(),
            holidays: Vec::new(),
        }
    }
}

/// CSS selector chains for each markup variant the listing has shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Result-list entries (one element per article).
    pub list_items: Vec<String>,
    /// Standalone result-item containers.
    pub item_containers: Vec<String>,
    /// Title anchors tagged for click heatmaps.
    pub heatmap_anchor: String,
    /// Byline/profile block that marks the enclosing card.
    pub profile_marker: String,
    /// Ancestor levels walked from a heatmap anchor looking for the card.
    pub max_ancestor_depth: usize,
    /// Title anchors, used when the locator did not supply one.
    pub title_anchor: Vec<String>,
    /// Outlet name elements.
    pub source: Vec<String>,
    /// Blocks holding the timestamp and edition subtexts.
    pub subtext: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            list_items: vec!["ul.list_news > li.bx".to_string()],
            item_containers: vec!["div.news_wrap".to_string(), "div.news_area".to_string()],
            heatmap_anchor: r#"a[data-heatmap-target=".tit"]"#.to_string(),
            profile_marker: ".sds-comps-profile, .sds-comps-profile-info, .news_info".to_string(),
            max_ancestor_depth: 5,
            title_anchor: vec![
                r#"a[data-heatmap-target=".tit"]"#.to_string(),
                "a.news_tit".to_string(),
                "a.title_link".to_string(),
            ],
            source: vec![
                ".sds-comps-profile-info-title-text".to_string(),
                ".press_name".to_string(),
                ".info.press".to_string(),
            ],
            subtext: vec![
                ".sds-comps-profile-info-subtexts".to_string(),
                ".news_info".to_string(),
            ],
        }
    }
}

impl SearchConfig {
    /// Check values serde cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                field: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.multi_term_quota_ratio > 0.0 && self.multi_term_quota_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "multi_term_quota_ratio",
                reason: format!("{} is outside (0, 1]", self.multi_term_quota_ratio),
            });
        }
        Ok(())
    }

    /// Parse and validate a YAML document. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let config = if text.trim().is_empty() {
            SearchConfig::default()
        } else {
            serde_yaml::from_str::<SearchConfig>(text)?
        };
        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<SearchConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(SearchConfig::default());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
    let config = SearchConfig::from_yaml(&text)?;
    info!(
        path,
        max_pages = config.max_pages,
        page_size = config.page_size,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = SearchConfig::from_yaml("").unwrap();
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.in_network_hosts, vec!["n.news.naver.com"]);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
max_pages: 5
strict_empty_pages: true
selectors:
  source:
    - .outlet
holidays:
  - 2025-10-06
"#;
        let config = SearchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_pages, 5);
        assert!(config.strict_empty_pages);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.selectors.source, vec![".outlet"]);
        assert_eq!(config.selectors.max_ancestor_depth, 5);
        assert_eq!(
            config.holidays,
            vec![NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()]
        );
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let err = SearchConfig::from_yaml("page_size: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "page_size", .. }));
    }

    #[test]
    fn test_rejects_quota_ratio_out_of_range() {
        let err = SearchConfig::from_yaml("multi_term_quota_ratio: 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "multi_term_quota_ratio",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(matches!(
            SearchConfig::from_yaml("max_pages: [oops"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[tokio::test]
    async fn test_load_config_without_path_uses_defaults() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config.page_size, 10);
    }
}
