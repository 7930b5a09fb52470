use std::fs::File;
use std::io::Read;
use std::path::Path;

use goalset_core::{FieldValue, Row};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{IngestError, Result};

/// Reads CSV files whose first column identifies the process of each row.
pub struct CsvImporter;

impl CsvImporter {
    pub fn import(path: &Path) -> Result<Dataset> {
        let file = File::open(path).map_err(|error| IngestError::Open {
            path: path.to_path_buf(),
            error,
        })?;
        let dataset = Self::from_reader(file, &path.display().to_string())?;
        info!(
            rows = dataset.rows.len(),
            columns = dataset.columns.len(),
            path = %path.display(),
            "imported dataset"
        );
        Ok(dataset)
    }

    /// Parse CSV text. `source_name` is only used in errors.
    ///
    /// Headers are trimmed and blank headers dropped. Rows without a process
    /// value are skipped. Process values are kept as text; every other cell
    /// becomes a number when it parses as one and `Null` when blank.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Dataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        let process_column = match headers.first() {
            Some(h) if !h.is_empty() => h.clone(),
            _ => {
                return Err(IngestError::MissingProcessColumn {
                    source_name: source_name.to_string(),
                })
            }
        };

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            let process = record.get(0).unwrap_or_default();
            if process.is_empty() {
                skipped += 1;
                continue;
            }

            let mut row = Row::new();
            row.set(process_column.as_str(), FieldValue::Text(process.to_string()));
            for (index, header) in headers.iter().enumerate().skip(1) {
                if header.is_empty() {
                    continue;
                }
                let cell = record.get(index).unwrap_or_default();
                row.set(header.as_str(), FieldValue::from_cell(cell));
            }
            rows.push(row);
        }

        if skipped > 0 {
            debug!(source = source_name, skipped, "rows without a process value skipped");
        }

        Ok(Dataset {
            columns: headers.into_iter().filter(|h| !h.is_empty()).collect(),
            process_column,
            rows,
        })
    }
}
