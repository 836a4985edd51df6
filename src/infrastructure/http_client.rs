//! HTTP client for page fetching
//!
//! Requests are issued one at a time. With the default configuration each
//! request gets a single attempt, so network failures surface immediately;
//! more attempts switch on exponential backoff.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::PageFetcher;
use crate::infrastructure::config::defaults;

/// Configuration for HTTP client behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Attempts per request, including the first one
    pub max_attempts: u32,
    /// Pause before every request in milliseconds
    pub request_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_attempts: defaults::MAX_ATTEMPTS,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fetch a page body as a string, retrying per configuration
    pub async fn fetch_html_string(&self, url: &str) -> Result<String> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.fetch_html_string_once(url).await {
                Ok(html) => {
                    debug!("Fetched {} on attempt {}", url, attempt);
                    return Ok(html);
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt, attempts, url, e);
                    last_error = Some(e);

                    if attempt < attempts {
                        let delay_seconds = 2_u64.pow(attempt - 1);
                        sleep(Duration::from_secs(delay_seconds)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Unknown error while fetching {}", url)))
    }

    /// Fetch raw response; non-success statuses are errors
    pub async fn fetch_response(&self, url: &str) -> Result<Response> {
        if self.config.request_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        info!("HTTP GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("HTTP request failed: {}", url))?;

        if !response.status().is_success() {
            error!("HTTP error {}: {}", response.status(), url);
            return Err(anyhow!("HTTP error {}: {}", response.status(), url));
        }

        Ok(response)
    }

    async fn fetch_html_string_once(&self, url: &str) -> Result<String> {
        let response = self.fetch_response(url).await?;

        let html_content = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if html_content.is_empty() {
            return Err(anyhow!("Empty response from {}", url));
        }

        Ok(html_content)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.fetch_html_string(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_default_is_single_attempt() {
        let config = HttpClientConfig::default();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.request_delay_ms, 0);
    }

    #[test]
    fn test_custom_config() {
        let config = HttpClientConfig {
            timeout_seconds: 10,
            max_attempts: 2,
            request_delay_ms: 0,
            user_agent: "Test Agent".to_string(),
            follow_redirects: false,
        };

        assert!(HttpClient::with_config(config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let config = HttpClientConfig {
            timeout_seconds: 2,
            ..Default::default()
        };
        let client = HttpClient::with_config(config).unwrap();

        let result = client.fetch_page("http://127.0.0.1:9/").await;
        assert!(result.is_err());
    }
}
