//! Configuration infrastructure
//!
//! Loads and saves the JSON configuration file and holds the Play Store
//! constants and default values used across the crate.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::application::charts::ChartConfig;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraping: ScrapingConfig,
    pub parsing: ParsingConfig,
    pub http: HttpClientConfig,
    pub charts: ChartConfig,
    pub logging: LoggingConfig,
}

/// Locale and entry point used when collecting identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// ISO 639-1 language code
    pub language: String,

    /// ISO 3166 country code
    pub country: String,

    /// Listing page used when no start URL is given on the command line
    pub start_url: String,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            language: defaults::LANGUAGE.to_string(),
            country: defaults::COUNTRY.to_string(),
            start_url: play_store::APPS_URL.to_string(),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            module_filters: HashMap::new(),
        }
    }
}

/// Reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the default configuration file location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Manager for an explicit configuration file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Write the default configuration if no file exists yet, otherwise load it
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return self.load_config().await;
        }

        info!("First run detected - writing default configuration to {:?}", self.config_path);
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    /// Load configuration; a missing file yields the defaults
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("No configuration at {:?}, using defaults", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", self.config_path))?;

        info!("Loaded configuration from {:?}", self.config_path);
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write config file {:?}", self.config_path))?;

        info!("Saved configuration to {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Google Play URLs and markup constants
pub mod play_store {
    /// Base URL that relative store links are resolved against
    pub const BASE_URL: &str = "https://play.google.com";

    /// Top-level apps listing page
    pub const APPS_URL: &str = "https://play.google.com/store/apps";

    /// Application detail page path; takes `id`, `hl` and `gl` query parameters
    pub const DETAILS_PATH: &str = "/store/apps/details";

    /// Class of the "See more" anchor on listing pages
    pub const SEE_MORE_CLASS: &str = "U8Ww7d";

    /// Class of application anchors on sub-listing pages
    pub const APP_LINK_CLASS: &str = "poRVub";
}

pub mod defaults {
    pub const APP_DIR_NAME: &str = "appdata-explorer";
    pub const CONFIG_FILE_NAME: &str = "appdata_explorer_config.json";

    pub const LANGUAGE: &str = "en";
    pub const COUNTRY: &str = "US";

    pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    /// One attempt per request; failures propagate to the caller
    pub const MAX_ATTEMPTS: u32 = 1;
    pub const REQUEST_DELAY_MS: u64 = 0;

    pub const GENRE_MIN_COUNT: usize = 20;
    pub const SIZE_CAP: f64 = 300.0;
    pub const SIZE_BUCKET_WIDTH: f64 = 3.0;
    pub const PRICE_AXIS_MAX: f64 = 40.0;
    pub const CHART_WIDTH: u32 = 1024;
    pub const CHART_HEIGHT: u32 = 768;
    pub const CHART_OUTPUT_DIR: &str = "charts";
    pub const JITTER_SEED: u64 = 42;

    pub const LOG_LEVEL: &str = "info";
}
