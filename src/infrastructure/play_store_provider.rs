//! Metadata provider backed by Play Store detail pages

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::domain::{AppDetails, AppId, MetadataProvider, PageFetcher};
use crate::infrastructure::config::play_store;
use crate::infrastructure::parsing::{DetailParser, ParsingConfig};

pub struct PlayStoreProvider<F> {
    fetcher: F,
    parser: DetailParser,
    base_url: String,
}

impl<F: PageFetcher> PlayStoreProvider<F> {
    pub fn new(fetcher: F, config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: DetailParser::from_config(config)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Detail page URL for `id` in the given locale
    pub fn details_url(&self, id: &AppId, language: &str, country: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join(play_store::DETAILS_PATH))
            .with_context(|| format!("Invalid marketplace base URL {}", self.base_url))?;

        url.query_pairs_mut()
            .append_pair("id", id.as_str())
            .append_pair("hl", language)
            .append_pair("gl", country);

        Ok(url.into())
    }
}

#[async_trait]
impl<F: PageFetcher> MetadataProvider for PlayStoreProvider<F> {
    async fn app_details(&self, id: &AppId, language: &str, country: &str) -> Result<AppDetails> {
        let url = self.details_url(id, language, country)?;
        let body = self
            .fetcher
            .fetch_page(&url)
            .await
            .with_context(|| format!("Failed to fetch details for {}", id))?;

        let details = self.parser.parse(&Html::parse_document(&body));
        debug!("{}: {} attributes", id, details.len());
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct RecordingFetcher {
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.requested.lock().map_err(|_| anyhow!("poisoned"))?.push(url.to_string());
            Ok(r#"<script type="application/ld+json">{"@type":"SoftwareApplication","name":"Kahoot!"}</script>"#.to_string())
        }
    }

    #[test]
    fn test_details_url() {
        let fetcher = RecordingFetcher { requested: Mutex::new(Vec::new()) };
        let provider = PlayStoreProvider::new(fetcher, &ParsingConfig::default()).unwrap();

        let url = provider.details_url(&AppId::new("com.netflix.mediaclient"), "de", "de").unwrap();
        assert_eq!(url, "https://play.google.com/store/apps/details?id=com.netflix.mediaclient&hl=de&gl=de");
    }

    #[tokio::test]
    async fn test_app_details_parses_fetched_page() {
        let fetcher = RecordingFetcher { requested: Mutex::new(Vec::new()) };
        let provider = PlayStoreProvider::new(fetcher, &ParsingConfig::default()).unwrap();

        let details = provider
            .app_details(&AppId::new("no.mobitroll.kahoot.android"), "en", "us")
            .await
            .unwrap();

        assert_eq!(details.get("title").and_then(|v| v.as_str()), Some("Kahoot!"));
        assert_eq!(provider.fetcher.requested.lock().unwrap().len(), 1);
    }
}
