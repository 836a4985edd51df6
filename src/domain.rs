//! Domain layer: identifiers, attribute records, datasets and service traits

pub mod app_id;
pub mod attributes;
pub mod dataset;
pub mod services;

pub use app_id::{AppId, AppIdCollection};
pub use attributes::{AppDetails, AttributeRecord, EXPORT_COLUMNS};
pub use dataset::{AppRow, Dataset, SizedDataset, columns};
pub use services::{MetadataProvider, PageFetcher};
