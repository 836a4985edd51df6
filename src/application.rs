//! Application layer
//!
//! Use cases that orchestrate the domain types and infrastructure services:
//! identifier collection, metadata export and chart generation.

pub mod charts;
pub mod exporter;
pub mod id_collector;

pub use charts::{ChartConfig, render_all};
pub use exporter::{ExportError, ExportSummary, MetadataExporter};
pub use id_collector::IdCollector;
