//! Rule validation with structured errors and suggestions.
//!
//! Checks stored rules and rule definitions before they are saved or
//! imported: required condition/action fields, known operators and action
//! types, numeric operands and nesting limits. Column references can also be
//! checked against a dataset's header.
//! Returns a [`ValidationResult`] with errors (block save) and warnings (advisory).

mod column_checks;
mod rule_checks;

pub mod fuzzy;

use crate::schema::*;
use serde::{Deserialize, Serialize};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"baseRule.condition.operator"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// First error rendered as `path: message`, for single-line reports.
    pub fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| {
            let mut line = if e.path.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.path, e.message)
            };
            if let Some(suggestion) = &e.suggestion {
                line.push_str(&format!(" ({suggestion})"));
            }
            line
        })
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a [`RuleDefinition`]: at least one of the base and calculated
/// rules is required, and each present rule must be complete. A calculated
/// rule without a base rule is a warning.
pub fn validate_definition(definition: &RuleDefinition) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_definition(definition, "", &mut result);
    result
}

/// Validate a [`StoredRule`]: a non-blank name plus a valid definition.
pub fn validate_stored_rule(rule: &StoredRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    if rule.name.trim().is_empty() {
        result.error("name", "Rule name is required");
    }
    rule_checks::validate_definition(&rule.rule, "rule", &mut result);
    result
}

/// Structural validation plus warnings for every column reference that is
/// not in `columns`. Goal fields and `G2_calculated` are always allowed.
pub fn validate_against_columns<S: AsRef<str>>(
    definition: &RuleDefinition,
    columns: &[S],
) -> ValidationResult {
    let mut result = validate_definition(definition);
    column_checks::validate_columns(definition, columns, &mut result);
    result
}

/// Parse a JSON rule definition and validate it. Parse errors are reported
/// as a single error at the root path.
pub fn validate_json(json: &str) -> ValidationResult {
    match serde_json::from_str::<RuleDefinition>(json) {
        Ok(definition) => validate_definition(&definition),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("JSON parse error: {e}"));
            result
        }
    }
}
