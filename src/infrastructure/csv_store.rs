//! CSV persistence for exported attribute records

use anyhow::{Context, Result};
use polars::prelude::{CsvReadOptions, SerReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{AttributeRecord, Dataset};

/// Write a header row of `columns` and one row per record.
///
/// The file is created (or truncated) only once the writer opens it, so an
/// unreachable directory leaves nothing behind.
pub fn write_records<P: AsRef<Path>>(path: P, columns: &[&str], records: &[AttributeRecord]) -> Result<(), csv::Error> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| record.cell(column)))?;
    }
    writer.flush()?;

    debug!("Wrote {} rows to {:?}", records.len(), path);
    Ok(())
}

/// Read an exported CSV file into a typed [`Dataset`].
///
/// Every column is read as text first, so `True`/`False` flags and empty
/// cells survive schema inference.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("Failed to read dataset {:?}", path))?;

    let dataset = Dataset::from_text_frame(frame).with_context(|| format!("Malformed dataset {:?}", path))?;
    info!("Loaded {} rows from {:?}", dataset.len(), path);
    Ok(dataset)
}

/// Resolves logical dataset names to `<base_dir>/<name>.csv`
#[derive(Debug, Clone)]
pub struct DatasetStore {
    pub base_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn dataset_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}.csv"))
    }

    pub fn dataset_exists(&self, name: &str) -> bool {
        self.dataset_path(name).is_file()
    }

    pub fn load_dataset(&self, name: &str) -> Result<Dataset> {
        load_dataset(self.dataset_path(name))
    }
}
