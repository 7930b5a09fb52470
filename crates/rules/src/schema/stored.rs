//! Stored rules and the JSON documents they are exported in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::null_as_default;
use super::node::RuleDefinition;

/// Version tag written into export documents.
pub const EXPORT_VERSION: &str = "2.2";

/// A named, persisted rule definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    /// Numeric id; `0` means "not yet assigned" and is replaced on import.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub rule: RuleDefinition,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl StoredRule {
    pub fn new(id: u64, name: impl Into<String>, rule: RuleDefinition) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            rule,
            created: now,
            last_modified: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case-insensitive name comparison used for upserts and merges.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    #[serde(default)]
    pub creator: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Goal Setting Framework".to_string(),
            creator: "goalset".to_string(),
        }
    }
}

/// Multi-rule export document; also the on-disk rule store format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExport {
    pub version: String,
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub app_info: AppInfo,
    pub rules: Vec<StoredRule>,
}

impl RuleExport {
    pub fn new(rules: Vec<StoredRule>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: Utc::now(),
            app_info: AppInfo::default(),
            rules,
        }
    }
}

/// Single-rule export with the name and description leading the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRuleExport {
    pub rule_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub app_info: Option<AppInfo>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    pub rule: RuleDefinition,
}

impl SingleRuleExport {
    pub fn from_rule(rule: &StoredRule) -> Self {
        Self {
            rule_name: rule.name.clone(),
            rule_description: rule.description.clone(),
            version: Some(EXPORT_VERSION.to_string()),
            export_date: Some(Utc::now()),
            app_info: Some(AppInfo::default()),
            id: Some(rule.id),
            created: Some(rule.created),
            last_modified: Some(rule.last_modified),
            rule: rule.rule.clone(),
        }
    }

    pub fn into_rule(self) -> StoredRule {
        let now = Utc::now();
        StoredRule {
            id: self.id.unwrap_or(0),
            name: self.rule_name,
            description: self.rule_description,
            rule: self.rule,
            created: self.created.unwrap_or(now),
            last_modified: self.last_modified.unwrap_or(now),
        }
    }
}
