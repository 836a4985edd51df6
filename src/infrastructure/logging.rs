//! Logging system configuration and initialization
//!
//! Console output by default, plus an optional plain or JSON log file. The
//! previous log file is renamed with its timestamp on startup so every run
//! starts a fresh file.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

pub const LOG_FILE_NAME: &str = "appdata-explorer.log";

/// Dependencies that are noisy below `trace`
const QUIET_TARGETS: [&str; 5] = ["reqwest=info", "hyper=warn", "hyper_util=warn", "html5ever=warn", "selectors=warn"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// Keeps the non-blocking file writer alive for the lifetime of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Log directory: the configured one, else `logs/` next to the executable
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return dir.clone();
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Rename an existing `log_file_name` to `<stem>.<timestamp>.log`
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path)
        .with_context(|| format!("Failed to get log file metadata {:?}", log_file_path))?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let datetime: DateTime<Local> = file_time.into();

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_path = log_dir.join(format!("{}.{}.log", file_stem, datetime.format("%Y%m%dT%H%M%S")));

    std::fs::rename(&log_file_path, &timestamped_path)
        .with_context(|| format!("Failed to rotate log file {:?} to {:?}", log_file_path, timestamped_path))?;

    Ok(Some(timestamped_path))
}

/// `RUST_LOG` when set, otherwise the configured level with quiet dependencies
/// and per-module overrides
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level).with_context(|| format!("Invalid log level '{}'", config.level))?;

    if !config.level.eq_ignore_ascii_case("trace") {
        for directive in QUIET_TARGETS {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    let mut modules: Vec<_> = config.module_filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        let directive = format!("{}={}", module, level);
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("Invalid module filter '{}'", directive))?,
        );
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` overrides the configured level and module filters:
/// ```bash
/// RUST_LOG="debug,reqwest=debug" appdata-explorer collect
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    let log_dir = get_log_directory(&config);
    if config.file_output {
        std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
        rotate_existing_log_file(&log_dir, LOG_FILE_NAME)?;

        let (file_writer, file_guard) = non_blocking(rolling::never(&log_dir, LOG_FILE_NAME));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
    }

    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?} (JSON: {})", log_dir.join(LOG_FILE_NAME), config.json_format);
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info(config: &LoggingConfig) {
    info!("=== appdata-explorer {} ===", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {} ({})", std::env::consts::OS, std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }

    if config.file_output {
        info!("Log directory: {:?}", get_log_directory(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_log_directory_defaults_next_to_executable() {
        let log_dir = get_log_directory(&LoggingConfig::default());
        assert!(log_dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_log_directory_override() {
        let config = LoggingConfig {
            log_dir: Some(PathBuf::from("/var/log/appdata")),
            ..LoggingConfig::default()
        };
        assert_eq!(get_log_directory(&config), PathBuf::from("/var/log/appdata"));
    }

    #[test]
    fn test_rotate_existing_log_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(rotate_existing_log_file(dir.path(), LOG_FILE_NAME).unwrap().is_none());

        std::fs::write(dir.path().join(LOG_FILE_NAME), "previous run\n").unwrap();
        let rotated = rotate_existing_log_file(dir.path(), LOG_FILE_NAME).unwrap().unwrap();

        assert!(!dir.path().join(LOG_FILE_NAME).exists());
        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "previous run\n");
        let name = rotated.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("appdata-explorer.") && name.ends_with(".log"));
    }

    #[test]
    fn test_invalid_module_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let mut config = LoggingConfig::default();
        config.module_filters.insert("reqwest".to_string(), "loud".to_string());
        assert!(build_env_filter(&config).is_err());
    }

    #[test]
    fn test_no_output_is_an_error() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(config).is_err());
    }
}
