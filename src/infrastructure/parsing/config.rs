//! Parsing configuration for marketplace markup
//!
//! CSS selectors are kept as ordered fallback lists; the first selector that
//! matches anything on a page wins.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::play_store;

/// Main parsing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Base URL that relative listing and detail links are resolved against
    pub base_url: String,

    pub listing_selectors: ListingSelectors,

    pub detail_selectors: DetailSelectors,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            base_url: play_store::BASE_URL.to_string(),
            listing_selectors: ListingSelectors::default(),
            detail_selectors: DetailSelectors::default(),
        }
    }
}

/// Selectors for listing and "see more" pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// "See more" controls leading to sub-listing pages
    pub see_more: Vec<String>,

    /// Application links on a sub-listing page
    pub app_link: Vec<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            see_more: vec![format!("a.{}", play_store::SEE_MORE_CLASS)],
            app_link: vec![format!("a.{}", play_store::APP_LINK_CLASS)],
        }
    }
}

/// Selectors for application detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    /// JSON-LD blocks describing the application
    pub structured_data: Vec<String>,

    /// Localized genre label
    pub genre: Vec<String>,

    /// Download size label
    pub size: Vec<String>,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            structured_data: vec!["script[type='application/ld+json']".to_string()],
            genre: vec![
                "[itemprop='genre']".to_string(),
                "a[href*='/store/apps/category/']".to_string(),
            ],
            size: vec![
                "[itemprop='fileSize']".to_string(),
                "[data-field='size']".to_string(),
            ],
        }
    }
}
