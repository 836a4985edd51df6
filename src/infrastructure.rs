//! Infrastructure layer for HTTP access, HTML parsing, CSV persistence,
//! chart rendering, configuration and logging

pub mod chart_renderer;
pub mod config;
pub mod csv_store;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod play_store_provider;

pub use config::{AppConfig, ConfigManager, play_store};
pub use csv_store::DatasetStore;
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{DetailParser, ListingParser, ParsingConfig, ParsingError, ParsingResult};
pub use play_store_provider::PlayStoreProvider;
