//! Error type for rule store operations.

/// Errors that can occur while persisting, importing or editing rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse/serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A rule failed validation (missing name, incomplete condition, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// No stored rule with the given id or name.
    #[error("rule not found: {0}")]
    NotFound(String),

    /// The document is none of the recognised rule file shapes.
    #[error("Invalid rule file format: {0}")]
    Format(String),
}

/// Result alias for rule store operations.
pub type Result<T> = std::result::Result<T, RuleError>;
