//! Service boundaries the application layer depends on

use anyhow::Result;
use async_trait::async_trait;

use super::app_id::AppId;
use super::attributes::AppDetails;

/// Fetches page markup by URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Looks up every known attribute of one application
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn app_details(&self, id: &AppId, language: &str, country: &str) -> Result<AppDetails>;
}
