//! Metadata export use case
//!
//! Looks up every identifier through a [`MetadataProvider`], projects the
//! result onto the export columns and writes `<file_name>.csv`.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::{AppId, AttributeRecord, EXPORT_COLUMNS, MetadataProvider};
use crate::infrastructure::csv_store;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Metadata lookup failed for {id}")]
    Provider {
        id: AppId,
        #[source]
        source: anyhow::Error,
    },

    /// The records were fetched but could not be written; they are handed
    /// back so the caller can retry with [`MetadataExporter::write_records`].
    #[error("Could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        records: Vec<AttributeRecord>,
        #[source]
        source: csv::Error,
    },
}

impl ExportError {
    /// Fetched records carried by a write failure
    pub fn into_records(self) -> Option<Vec<AttributeRecord>> {
        match self {
            Self::Write { records, .. } => Some(records),
            Self::Provider { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

pub struct MetadataExporter<P> {
    provider: P,
}

impl<P: MetadataProvider> MetadataExporter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Path written by [`MetadataExporter::export`] for `file_name`
    pub fn export_path(file_name: &str) -> PathBuf {
        PathBuf::from(format!("{file_name}.csv"))
    }

    /// Full provider details for `id`, reduced to the keys named in `attribute_names`
    pub async fn fetch_attributes<S: AsRef<str> + Sync>(
        &self,
        id: &AppId,
        language: &str,
        country: &str,
        attribute_names: &[S],
    ) -> Result<AttributeRecord> {
        let details = self.provider.app_details(id, language, country).await?;
        let record = AttributeRecord::project(&details, attribute_names);
        debug!("{}: kept {} of {} attributes", id, record.len(), details.len());
        Ok(record)
    }

    /// Fetch every identifier and write `<file_name>.csv`, replacing any existing file.
    ///
    /// A provider failure aborts the run. A write failure is logged and
    /// returned with the fetched records attached.
    pub async fn export(
        &self,
        ids: &[AppId],
        file_name: &str,
        language: &str,
        country: &str,
    ) -> Result<ExportSummary, ExportError> {
        info!("Exporting {} applications ({}/{})", ids.len(), language, country);

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .fetch_attributes(id, language, country, &EXPORT_COLUMNS)
                .await
                .map_err(|source| ExportError::Provider { id: id.clone(), source })?;
            records.push(record);
        }

        Self::write_records(Self::export_path(file_name), records)
    }

    /// Write already fetched records with the export header
    pub fn write_records(path: impl AsRef<Path>, records: Vec<AttributeRecord>) -> Result<ExportSummary, ExportError> {
        let path = path.as_ref().to_path_buf();

        match csv_store::write_records(&path, &EXPORT_COLUMNS, &records) {
            Ok(()) => {
                info!("Wrote {} rows to {:?}", records.len(), path);
                Ok(ExportSummary {
                    path,
                    rows: records.len(),
                })
            }
            Err(source) => {
                error!("I/O error writing {:?}: {}", path, source);
                Err(ExportError::Write { path, records, source })
            }
        }
    }
}
