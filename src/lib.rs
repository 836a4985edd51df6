//! appdata-explorer
//!
//! Collects Google Play application identifiers from listing pages, exports
//! their metadata to CSV and renders exploratory charts from the export.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
