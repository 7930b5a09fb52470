//! Core [`RuleStore`] struct: stored-rule lifecycle and file persistence.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::schema::{RuleDefinition, RuleExport, StoredRule};
use crate::validation::validate_stored_rule;

use super::error::{Result, RuleError};
use super::transfer::parse_rules;

/// Serialization format of a rule file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// `.yml`/`.yaml` are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

/// Ordered collection of stored rules.
///
/// Names are unique case-insensitively: saving under an existing name
/// updates that rule in place. Ids are millisecond timestamps, bumped when
/// two rules are created within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<StoredRule>,
    /// Highest id handed out or loaded so far.
    last_id: u64,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing rules, keeping their ids. Rules without
    /// an id, or with an id already taken, get a fresh one.
    pub fn from_rules(rules: Vec<StoredRule>) -> Self {
        let mut store = Self {
            rules: Vec::with_capacity(rules.len()),
            last_id: rules.iter().map(|r| r.id).max().unwrap_or(0),
        };
        for mut rule in rules {
            if rule.id == 0 || store.get(rule.id).is_some() {
                rule.id = store.next_id();
            }
            store.rules.push(rule);
        }
        store
    }

    pub fn rules(&self) -> &[StoredRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&StoredRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&StoredRule> {
        self.rules.iter().find(|r| r.has_name(name))
    }

    /// Look a rule up by numeric id or, failing that, by name.
    pub fn find(&self, key: &str) -> Option<&StoredRule> {
        key.trim()
            .parse::<u64>()
            .ok()
            .and_then(|id| self.get(id))
            .or_else(|| self.find_by_name(key))
    }

    /// Save a rule under `name`.
    ///
    /// An existing rule with the same name (ignoring case) is updated in
    /// place and keeps its id and creation time; otherwise a new rule is
    /// appended. The rule is validated first. Returns the rule's id.
    pub fn save(&mut self, name: &str, description: &str, rule: RuleDefinition) -> Result<u64> {
        let candidate = StoredRule::new(0, name, rule).with_description(description);
        let validation = validate_stored_rule(&candidate);
        if !validation.valid {
            let reason = validation.first_error().unwrap_or_default();
            return Err(RuleError::Validation(format!("rule '{name}': {reason}")));
        }

        if let Some(existing) = self.rules.iter_mut().find(|r| r.has_name(name)) {
            existing.name = candidate.name;
            existing.description = candidate.description;
            existing.rule = candidate.rule;
            existing.last_modified = Utc::now();
            info!(rule_id = existing.id, name = %existing.name, "updated rule");
            return Ok(existing.id);
        }

        let id = self.next_id();
        let rule = StoredRule { id, ..candidate };
        info!(rule_id = id, name = %rule.name, "saved rule");
        self.rules.push(rule);
        Ok(id)
    }

    /// Copy a rule under the first free name of `"<name> (Copy)"`,
    /// `"<name> (Copy 2)"`, ... Returns the new rule's id.
    pub fn duplicate(&mut self, id: u64) -> Result<u64> {
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;

        let mut name = format!("{} (Copy)", source.name);
        let mut counter = 1;
        while self.find_by_name(&name).is_some() {
            counter += 1;
            name = format!("{} (Copy {counter})", source.name);
        }

        debug!(rule_id = id, copy = %name, "duplicating rule");
        self.save(&name, &source.description, source.rule)
    }

    /// Remove a rule and return it.
    pub fn delete(&mut self, id: u64) -> Result<StoredRule> {
        let index = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        let removed = self.rules.remove(index);
        info!(rule_id = id, name = %removed.name, "deleted rule");
        Ok(removed)
    }

    /// Resolve ids or names to rule ids, in the given order. An empty
    /// selection means every rule in store order.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<u64>> {
        if keys.is_empty() {
            return Ok(self.rules.iter().map(|r| r.id).collect());
        }
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                self.find(key)
                    .map(|r| r.id)
                    .ok_or_else(|| RuleError::NotFound(key.to_string()))
            })
            .collect()
    }

    pub(crate) fn push(&mut self, rule: StoredRule) {
        self.last_id = self.last_id.max(rule.id);
        self.rules.push(rule);
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Load the store at `path`, or start empty when the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no rule store yet, starting empty");
            return Ok(Self::new());
        }
        Self::load_file(path)
    }

    /// Load rules from a JSON or YAML file in any of the import shapes.
    ///
    /// Rules that fail validation are kept so they can be fixed or deleted,
    /// but each one is logged.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let rules = parse_rules(&contents, FileFormat::from_path(path))?;

        for rule in &rules {
            let validation = validate_stored_rule(rule);
            if !validation.valid {
                warn!(
                    rule_id = rule.id,
                    name = %rule.name,
                    error = %validation.first_error().unwrap_or_default(),
                    "stored rule is invalid"
                );
            }
        }

        let store = Self::from_rules(rules);
        info!(path = %path.display(), rules = store.len(), "loaded rule store");
        Ok(store)
    }

    /// Atomically write the store as an export document.
    ///
    /// Writes to a `.tmp` file next to `path` first, then renames it into
    /// place to avoid partial writes on crash.
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let document = RuleExport::new(self.rules.clone());
        let contents = match FileFormat::from_path(path) {
            FileFormat::Json => serde_json::to_string_pretty(&document)?,
            FileFormat::Yaml => serde_yaml::to_string(&document)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("rules");
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), rules = self.len(), "wrote rule store");
        Ok(())
    }
}
