//! Dataset ingestion and results export.
//!
//! - [`CsvImporter`]: CSV files to [`Dataset`]s of rows keyed by header
//! - [`Dataset`]: merge of several files, process listing and filtering
//! - [`csv_export`]: results sheet, rule-application details and audit JSON

pub mod csv_export;
mod csv_import;
mod dataset;
mod error;

pub use csv_import::CsvImporter;
pub use dataset::Dataset;
pub use error::{IngestError, Result};
