//! Identifier collection use case
//!
//! Fetches a listing page, follows its "see more" links one after another and
//! gathers the application identifiers found on each sub-listing page.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, info};

use crate::domain::{AppId, AppIdCollection, PageFetcher};
use crate::infrastructure::parsing::{ListingParser, ParsingConfig, ParsingResult};

pub struct IdCollector<F> {
    fetcher: F,
    parser: ListingParser,
}

impl<F: PageFetcher> IdCollector<F> {
    pub fn new(fetcher: F, config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: ListingParser::from_config(config)?,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// "See more" links of a listing page with the locale appended. No I/O.
    pub fn discover_subpages(&self, page_content: &str, language: &str, country: &str) -> Vec<String> {
        let html = Html::parse_document(page_content);
        self.parser.discover_subpages(&html, language, country)
    }

    /// Identifiers linked from a sub-listing page. No I/O.
    pub fn extract_identifiers(&self, subpage_content: &str) -> ParsingResult<Vec<AppId>> {
        let html = Html::parse_document(subpage_content);
        self.parser.extract_identifiers(&html)
    }

    /// Collect identifiers reachable from `start_url` and merge them into `ids`.
    ///
    /// The caller always supplies the starting collection; the updated one is
    /// returned.
    pub async fn collect(
        &self,
        start_url: &str,
        mut ids: AppIdCollection,
        language: &str,
        country: &str,
    ) -> Result<AppIdCollection> {
        self.collect_into(start_url, &mut ids, language, country).await?;
        Ok(ids)
    }

    /// Like [`IdCollector::collect`] but merges in place and returns the number
    /// of new identifiers. Nothing is merged unless every page succeeds.
    pub async fn collect_into(
        &self,
        start_url: &str,
        ids: &mut AppIdCollection,
        language: &str,
        country: &str,
    ) -> Result<usize> {
        let start_page = self
            .fetcher
            .fetch_page(start_url)
            .await
            .with_context(|| format!("Failed to fetch listing page {}", start_url))?;

        let subpages = self.discover_subpages(&start_page, language, country);
        info!("Found {} sub-listing pages on {}", subpages.len(), start_url);

        let mut discovered = Vec::new();
        for fragment in &subpages {
            let url = self.parser.resolve(fragment)?;
            let content = self
                .fetcher
                .fetch_page(&url)
                .await
                .with_context(|| format!("Failed to fetch sub-listing page {}", url))?;

            let page_ids = self
                .extract_identifiers(&content)
                .with_context(|| format!("Unexpected markup on {}", url))?;
            debug!("{} identifiers on {}", page_ids.len(), url);
            discovered.extend(page_ids);
        }

        let added = ids.extend_unique(discovered);
        info!("Collected {} new identifiers ({} total)", added, ids.len());
        Ok(added)
    }
}
