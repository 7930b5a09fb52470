//! Error type for dataset import and export.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file has no header row, or its first header is blank.
    #[error("{source_name}: first column must name the process column")]
    MissingProcessColumn { source_name: String },

    #[error("could not open {path}: {error}")]
    Open {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
