//! Import and export of rule documents.
//!
//! Three document shapes are accepted on import:
//! - a single-rule export (`ruleName` + `rule` at the top level)
//! - a bare array of stored rules
//! - a multi-rule export document with a `rules` array

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::schema::{RuleExport, SingleRuleExport, StoredRule};
use crate::validation::validate_stored_rule;

use super::core::{FileFormat, RuleStore};
use super::error::{Result, RuleError};

/// File name used when exporting every rule at once.
pub const EXPORT_FILE_NAME: &str = "goal_setting_rules.json";

/// How imported rules combine with the rules already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Add rules whose names are not taken yet; fresh ids are assigned.
    #[default]
    Merge,
    /// Discard every stored rule and keep the imported ids.
    Replace,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Merge => f.write_str("merge"),
            ImportMode::Replace => f.write_str("replace"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(ImportMode::Merge),
            "replace" => Ok(ImportMode::Replace),
            other => Err(RuleError::Format(format!(
                "unknown import mode '{other}', expected merge or replace"
            ))),
        }
    }
}

/// Result of an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Mode actually applied; importing into an empty store always replaces.
    pub mode: ImportMode,
    pub imported: usize,
    /// Names skipped in merge mode because they already existed.
    pub skipped: Vec<String>,
}

/// Parse a rule document into stored rules without validating them.
pub fn parse_rules(text: &str, format: FileFormat) -> Result<Vec<StoredRule>> {
    let value: Value = match format {
        FileFormat::Json => serde_json::from_str(text)?,
        FileFormat::Yaml => serde_yaml::from_str(text)?,
    };

    if value.get("ruleName").is_some() && value.get("rule").is_some() {
        let single: SingleRuleExport = serde_json::from_value(value)?;
        return Ok(vec![single.into_rule()]);
    }

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("rules") {
            Some(Value::Array(entries)) => {
                if let Some(version) = map.get("version").and_then(Value::as_str) {
                    debug!(version, "importing export document");
                }
                entries
            }
            _ => return Err(unknown_shape()),
        },
        _ => return Err(unknown_shape()),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let complete = entry.get("name").is_some_and(|n| !n.is_null())
                && entry.get("rule").is_some_and(|r| !r.is_null());
            if !complete {
                return Err(RuleError::Validation(format!(
                    "invalid rule structure at index {index}"
                )));
            }
            Ok(serde_json::from_value(entry)?)
        })
        .collect()
}

fn unknown_shape() -> RuleError {
    RuleError::Format("expected a rule, a list of rules or an export document".into())
}

/// Replace characters that are unsafe in file names with `_`.
///
/// Path separators, wildcards, quotes, angle brackets and pipes become `_`,
/// whitespace runs become a single `_`, and repeated `_` collapse to one.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let reserved = matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|');
        let c = if c.is_whitespace() || reserved { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

impl RuleStore {
    /// Import rules from a document in any accepted shape.
    ///
    /// Every rule is validated before anything changes; the first invalid
    /// rule aborts the import and is named in the error.
    pub fn import(
        &mut self,
        text: &str,
        format: FileFormat,
        mode: ImportMode,
    ) -> Result<ImportSummary> {
        let rules = parse_rules(text, format)?;
        if rules.is_empty() {
            return Err(RuleError::Format("no rules found in the file".into()));
        }

        for rule in &rules {
            let validation = validate_stored_rule(rule);
            if !validation.valid {
                let reason = validation.first_error().unwrap_or_default();
                return Err(RuleError::Validation(format!(
                    "invalid rule '{}': {reason}",
                    rule.name
                )));
            }
        }

        let mode = if self.is_empty() { ImportMode::Replace } else { mode };
        let summary = match mode {
            ImportMode::Merge => {
                let mut imported = 0;
                let mut skipped = Vec::new();
                for mut rule in rules {
                    if self.find_by_name(&rule.name).is_some() {
                        skipped.push(rule.name);
                        continue;
                    }
                    rule.id = self.next_id();
                    self.push(rule);
                    imported += 1;
                }
                ImportSummary {
                    mode,
                    imported,
                    skipped,
                }
            }
            ImportMode::Replace => {
                let imported = rules.len();
                *self = RuleStore::from_rules(rules);
                ImportSummary {
                    mode,
                    imported,
                    skipped: Vec::new(),
                }
            }
        };

        info!(
            mode = %summary.mode,
            imported = summary.imported,
            skipped = summary.skipped.len(),
            "imported rules"
        );
        Ok(summary)
    }

    /// Export every rule as a versioned export document.
    pub fn export(&self) -> Result<RuleExport> {
        if self.is_empty() {
            return Err(RuleError::Validation("no rules to export".into()));
        }
        Ok(RuleExport::new(self.rules().to_vec()))
    }

    /// Export one rule in the single-rule shape, with the file name it is
    /// conventionally saved under.
    pub fn export_single(&self, id: u64) -> Result<(String, SingleRuleExport)> {
        let rule = self
            .get(id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        let file_name = format!("{}.json", sanitize_filename(&rule.name));
        Ok((file_name, SingleRuleExport::from_rule(rule)))
    }
}
