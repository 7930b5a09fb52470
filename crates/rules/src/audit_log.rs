//! Per-row audit trail of a goal calculation pass.
//!
//! One [`ProcessAudit`] per processed row, keyed by process id in row order.
//! Each pass builds a fresh [`AuditTrail`], so nothing accumulates across
//! passes.

use goalset_core::{NullHandling, Row};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::evaluator::{CalculationStep, RuleOutcome};

/// How one row's goals were derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAudit {
    pub original_values: Row,
    pub result_values: Row,
    /// Every base/calculated evaluation, in evaluation order.
    pub applied_rules: Vec<RuleOutcome>,
    /// Stored-rule ids with at least one phase that applied.
    pub processed_rule_ids: Vec<u64>,
    pub null_values_encountered: IndexSet<String>,
    pub null_handling_strategy: NullHandling,
    pub g2_goal_calculation_path: Vec<CalculationStep>,
    pub final_g2_goal: Option<f64>,
    pub g2_goal_source: Option<String>,
}

impl ProcessAudit {
    pub fn new(original_values: Row, null_handling: NullHandling) -> Self {
        Self {
            result_values: original_values.clone(),
            original_values,
            applied_rules: Vec::new(),
            processed_rule_ids: Vec::new(),
            null_values_encountered: IndexSet::new(),
            null_handling_strategy: null_handling,
            g2_goal_calculation_path: Vec::new(),
            final_g2_goal: None,
            g2_goal_source: None,
        }
    }

    /// Append a rule outcome and fold its null fields into the row totals.
    pub fn record(&mut self, outcome: RuleOutcome) {
        self.null_values_encountered
            .extend(outcome.null_fields.iter().cloned());
        if outcome.applied && !self.processed_rule_ids.contains(&outcome.rule_id) {
            self.processed_rule_ids.push(outcome.rule_id);
        }
        self.applied_rules.push(outcome);
    }

    /// Number of recorded evaluations that applied.
    pub fn applied_rule_count(&self) -> usize {
        self.applied_rules.iter().filter(|o| o.applied).count()
    }

    /// Null fields as shown in reports, comma separated.
    pub fn null_summary(&self) -> String {
        self.null_values_encountered
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Audit entries of one pass, keyed by process id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: IndexMap<String, ProcessAudit>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a repeated process id replaces the earlier entry and
    /// returns it.
    pub fn insert(
        &mut self,
        process_id: impl Into<String>,
        audit: ProcessAudit,
    ) -> Option<ProcessAudit> {
        self.entries.insert(process_id.into(), audit)
    }

    pub fn get(&self, process_id: &str) -> Option<&ProcessAudit> {
        self.entries.get(process_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessAudit)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
