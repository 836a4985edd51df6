//! Command line interface
//!
//! Exit codes: 0 = success, 1 = any failure (reported on stderr).

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::application::{ExportError, ExportSummary, IdCollector, MetadataExporter, charts};
use crate::domain::{AppId, AppIdCollection, AttributeRecord};
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::{DatasetStore, HttpClient, PlayStoreProvider, csv_store};

#[derive(Parser, Debug)]
#[command(name = "appdata-explorer")]
#[command(about = "Collect Play Store app identifiers, export their metadata to CSV and plot it")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Configuration file (defaults to the user config directory)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Language code, e.g. 'en' (overrides the config)")]
    pub language: Option<String>,

    #[arg(short = 'g', long, global = true, help = "Country code, e.g. 'US' (overrides the config)")]
    pub country: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect application identifiers from a listing page and its "see more" pages
    Collect {
        #[arg(short, long, help = "Listing page to start from (defaults to the configured start URL)")]
        start_url: Option<String>,

        #[arg(short, long, help = "Identifier file (one per line) to merge into; created if missing")]
        ids: Option<PathBuf>,
    },

    /// Export metadata of the given identifiers to <name>.csv
    Export {
        #[arg(short, long, help = "Output file name without the .csv extension")]
        name: String,

        #[arg(short, long, help = "Identifier file, one per line")]
        ids: Option<PathBuf>,

        #[arg(long = "id", help = "Identifier to export (repeatable)")]
        app_ids: Vec<String>,

        #[arg(short, long, help = "Collect identifiers from this listing page instead")]
        start_url: Option<String>,
    },

    /// Render the exploratory charts for an exported CSV file
    Plot {
        #[arg(help = "CSV file written by the export command, or its name without .csv")]
        dataset: String,

        #[arg(short, long, help = "Output directory (defaults to the configured chart directory)")]
        out_dir: Option<PathBuf>,
    },

    /// Write the default configuration file if none exists
    InitConfig,
}

impl Cli {
    pub fn config_manager(&self) -> Result<ConfigManager> {
        config_manager_for(self.config.clone())
    }

    /// Apply command line overrides to the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(language) = &self.language {
            config.scraping.language.clone_from(language);
        }
        if let Some(country) = &self.country {
            config.scraping.country.clone_from(country);
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Collect { start_url, ids } => {
            let start_url = start_url.unwrap_or_else(|| config.scraping.start_url.clone());
            let existing = match &ids {
                Some(path) if path.exists() => read_id_file(path)?,
                _ => AppIdCollection::new(),
            };

            let collected = collect_ids(&config, &start_url, existing).await?;
            match &ids {
                Some(path) => {
                    write_id_file(path, &collected)?;
                    info!("Saved {} identifiers to {:?}", collected.len(), path);
                }
                None => print_ids(&collected)?,
            }
            Ok(())
        }
        Commands::Export {
            name,
            ids,
            app_ids,
            start_url,
        } => {
            let mut collection = match &ids {
                Some(path) => read_id_file(path)?,
                None => AppIdCollection::new(),
            };
            collection.extend_unique(app_ids.into_iter().map(AppId::from));
            if let Some(start_url) = start_url {
                collection = collect_ids(&config, &start_url, collection).await?;
            }
            if collection.is_empty() {
                warn!("No identifiers given; writing a header-only file");
            }

            export_metadata(&config, collection.as_slice(), &name).await
        }
        Commands::Plot { dataset, out_dir } => {
            let data = if Path::new(&dataset).extension().is_some() {
                csv_store::load_dataset(&dataset)?
            } else {
                DatasetStore::new(".").load_dataset(&dataset)?
            };
            let out_dir = out_dir.unwrap_or_else(|| config.charts.output_dir.clone());
            let written = charts::render_all(&data, &config.charts, &out_dir)
                .with_context(|| format!("Failed to plot {}", dataset))?;

            let mut stdout = std::io::stdout().lock();
            for path in written {
                writeln!(stdout, "{}", path.display())?;
            }
            Ok(())
        }
        Commands::InitConfig => {
            let manager = config_manager_for(cli.config)?;
            manager.initialize_on_first_run().await?;
            println!("{}", manager.config_path().display());
            Ok(())
        }
    }
}

fn config_manager_for(config: Option<PathBuf>) -> Result<ConfigManager> {
    config.map_or_else(ConfigManager::new, |path| Ok(ConfigManager::with_path(path)))
}

async fn collect_ids(config: &AppConfig, start_url: &str, ids: AppIdCollection) -> Result<AppIdCollection> {
    let client = HttpClient::with_config(config.http.clone())?;
    let collector = IdCollector::new(client, &config.parsing)?;
    collector
        .collect(start_url, ids, &config.scraping.language, &config.scraping.country)
        .await
}

async fn export_metadata(config: &AppConfig, ids: &[AppId], name: &str) -> Result<()> {
    let client = HttpClient::with_config(config.http.clone())?;
    let exporter = MetadataExporter::new(PlayStoreProvider::new(client, &config.parsing)?);

    match exporter
        .export(ids, name, &config.scraping.language, &config.scraping.country)
        .await
    {
        Ok(summary) => {
            println!("{} ({} rows)", summary.path.display(), summary.rows);
            Ok(())
        }
        Err(ExportError::Write { path, records, source }) => {
            eprintln!("I/O error: could not write {} ({} records fetched): {}", path.display(), records.len(), source);
            match save_fetched_records(&path, records, &std::env::temp_dir()) {
                Ok(summary) => eprintln!("Fetched records saved to {} ({} rows)", summary.path.display(), summary.rows),
                Err(e) => eprintln!("I/O error: fetched records could not be saved either: {}", e),
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write records whose export target failed to `<fallback_dir>/<file name>`
fn save_fetched_records(
    failed_path: &Path,
    records: Vec<AttributeRecord>,
    fallback_dir: &Path,
) -> Result<ExportSummary, ExportError> {
    let file_name = failed_path
        .file_name()
        .map_or_else(|| "export.csv".into(), std::ffi::OsStr::to_os_string);
    MetadataExporter::<PlayStoreProvider<HttpClient>>::write_records(fallback_dir.join(file_name), records)
}

/// Identifiers from a file with one identifier per line; blank lines are skipped
pub fn read_id_file(path: &Path) -> Result<AppIdCollection> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read identifier file {:?}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(AppId::from)
        .collect())
}

pub fn write_id_file(path: &Path, ids: &AppIdCollection) -> Result<()> {
    let mut content = String::new();
    for id in ids {
        content.push_str(id.as_str());
        content.push('\n');
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write identifier file {:?}", path))
}

fn print_ids(ids: &AppIdCollection) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for id in ids {
        writeln!(stdout, "{}", id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::try_parse_from([
            "appdata-explorer",
            "--language",
            "de",
            "export",
            "--name",
            "apps",
            "--id",
            "com.netflix.mediaclient",
            "--id",
            "no.mobitroll.kahoot.android",
        ])
        .unwrap();

        match &cli.command {
            Commands::Export { name, app_ids, ids, .. } => {
                assert_eq!(name, "apps");
                assert_eq!(app_ids.len(), 2);
                assert!(ids.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.scraping.language, "de");
        assert_eq!(config.scraping.country, "US");
    }

    #[test]
    fn test_fetched_records_survive_an_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let failed = dir.path().join("missing").join("apps.csv");
        let record: AttributeRecord = [("title", serde_json::json!("Netflix"))].into_iter().collect();

        let summary = save_fetched_records(&failed, vec![record], dir.path()).unwrap();

        assert_eq!(summary.path, dir.path().join("apps.csv"));
        assert_eq!(summary.rows, 1);
        let content = std::fs::read_to_string(&summary.path).unwrap();
        assert!(content.starts_with("title,free,score,price,contentRating,genre,size\n"));
        assert!(content.contains("Netflix,,,,,,"));
    }

    #[test]
    fn test_id_file_round_trip_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "a.b\n\n  c.d \na.b\n").unwrap();

        let ids = read_id_file(&path).unwrap();
        assert_eq!(ids.len(), 2);

        write_id_file(&path, &ids).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a.b\nc.d\n");
    }
}
