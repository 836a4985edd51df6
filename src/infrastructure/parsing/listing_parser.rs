//! Listing page parser
//!
//! Finds "see more" sub-listing links on a listing page and application
//! identifiers on a sub-listing page.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::config::ListingSelectors;
use super::{ParsingConfig, ParsingError, ParsingResult, compile_selectors, select_first_matching};
use crate::domain::AppId;

/// Query parameter holding the application identifier in detail links
const ID_PARAM: &str = "id";

pub struct ListingParser {
    base_url: Url,
    see_more_selectors: Vec<Selector>,
    app_link_selectors: Vec<Selector>,
    app_link_sources: Vec<String>,
}

impl ListingParser {
    /// Create a parser with the default Play Store selectors
    pub fn new() -> ParsingResult<Self> {
        Self::from_config(&ParsingConfig::default())
    }

    pub fn from_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Self::with_selectors(&config.base_url, &config.listing_selectors)
    }

    pub fn with_selectors(base_url: &str, selectors: &ListingSelectors) -> ParsingResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ParsingError::url_resolution_failed(base_url, e, None))?;

        Ok(Self {
            base_url,
            see_more_selectors: compile_selectors("see_more", &selectors.see_more)?,
            app_link_selectors: compile_selectors("app_link", &selectors.app_link)?,
            app_link_sources: selectors.app_link.clone(),
        })
    }

    /// Collect "see more" hrefs with `hl`/`gl` locale parameters appended.
    ///
    /// Returned fragments are relative to the marketplace base URL; see
    /// [`ListingParser::resolve`]. Anchors without an `href` are skipped.
    pub fn discover_subpages(&self, html: &Html, language: &str, country: &str) -> Vec<String> {
        let Some((_, anchors)) = select_first_matching(html, &self.see_more_selectors) else {
            debug!("No 'see more' links on listing page");
            return Vec::new();
        };

        anchors
            .iter()
            .filter_map(|anchor| {
                let href = anchor.value().attr("href");
                if href.is_none() {
                    debug!("Skipping 'see more' element without href");
                }
                href
            })
            .map(|href| with_locale(href, language, country))
            .collect()
    }

    /// Read the identifier out of every application link on a sub-listing page.
    ///
    /// A link without an `href`, or without an `id` query parameter, means the
    /// page no longer has the expected shape and fails the whole page.
    pub fn extract_identifiers(&self, html: &Html) -> ParsingResult<Vec<AppId>> {
        let Some((index, links)) = select_first_matching(html, &self.app_link_selectors) else {
            debug!("No application links on sub-listing page");
            return Ok(Vec::new());
        };
        let source = self.app_link_sources.get(index).map_or("app_link", String::as_str);

        let mut ids = Vec::with_capacity(links.len());
        for link in links {
            let href = link
                .value()
                .attr("href")
                .ok_or_else(|| ParsingError::required_attribute_missing("href", source))?;
            ids.push(self.identifier_from_href(href)?);
        }

        debug!("Extracted {} identifiers", ids.len());
        Ok(ids)
    }

    /// Resolve a discovered fragment against the marketplace base URL
    pub fn resolve(&self, fragment: &str) -> ParsingResult<String> {
        self.base_url
            .join(fragment)
            .map(String::from)
            .map_err(|e| ParsingError::url_resolution_failed(fragment, e, Some(self.base_url.as_str())))
    }

    fn identifier_from_href(&self, href: &str) -> ParsingResult<AppId> {
        let url = self
            .base_url
            .join(href)
            .map_err(|e| ParsingError::url_resolution_failed(href, e, Some(self.base_url.as_str())))?;

        url.query_pairs()
            .find(|(key, value)| key == ID_PARAM && !value.is_empty())
            .map(|(_, value)| AppId::new(value.into_owned()))
            .ok_or_else(|| ParsingError::identifier_missing(href))
    }
}

/// Append `hl`/`gl` to an href, respecting an existing query string
pub fn with_locale(href: &str, language: &str, country: &str) -> String {
    let separator = if href.contains('?') { '&' } else { '?' };
    format!("{href}{separator}hl={language}&gl={country}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <a class="U8Ww7d" href="/store/apps/collection/cluster?clp=abc">See more</a>
          <a class="other" href="/ignored">Other</a>
          <a class="U8Ww7d" href="/store/apps/top">See more</a>
          <a class="U8Ww7d">Broken</a>
        </body></html>
    "#;

    const SUBLISTING: &str = r#"
        <html><body>
          <a class="poRVub" href="/store/apps/details?id=com.netflix.mediaclient">Netflix</a>
          <a class="poRVub" href="/store/apps/details?id=no.mobitroll.kahoot.android&amp;hl=en">Kahoot!</a>
        </body></html>
    "#;

    #[test]
    fn test_parser_creation() {
        assert!(ListingParser::new().is_ok());
    }

    #[test]
    fn test_discover_subpages_appends_locale() {
        let parser = ListingParser::new().unwrap();
        let html = Html::parse_document(LISTING);

        let pages = parser.discover_subpages(&html, "en", "US");
        assert_eq!(
            pages,
            vec![
                "/store/apps/collection/cluster?clp=abc&hl=en&gl=US".to_string(),
                "/store/apps/top?hl=en&gl=US".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_identifiers_reads_id_param() {
        let parser = ListingParser::new().unwrap();
        let html = Html::parse_document(SUBLISTING);

        let ids = parser.extract_identifiers(&html).unwrap();
        assert_eq!(
            ids,
            vec![
                AppId::new("com.netflix.mediaclient"),
                AppId::new("no.mobitroll.kahoot.android"),
            ]
        );
    }

    #[test]
    fn test_extract_identifiers_fails_on_unexpected_link_shape() {
        let parser = ListingParser::new().unwrap();
        let html = Html::parse_document(r#"<a class="poRVub" href="/store/apps/dev?name=x">Dev</a>"#);

        let err = parser.extract_identifiers(&html).unwrap_err();
        assert!(matches!(err, ParsingError::IdentifierMissing { .. }));
    }

    #[test]
    fn test_resolve_against_base() {
        let parser = ListingParser::new().unwrap();
        let url = parser.resolve("/store/apps/top?hl=de&gl=DE").unwrap();
        assert_eq!(url, "https://play.google.com/store/apps/top?hl=de&gl=DE");
    }
}
