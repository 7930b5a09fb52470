//! Recursive rule-node evaluation.

use goalset_core::NullHandling;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{Action, RuleNode};

use super::access::FieldSource;
use super::action::{apply_action, ActionTrace};
use super::condition::{evaluate_compound, ConditionTrace};
use super::{EvalError, MAX_NESTING_DEPTH};

/// One step in the derivation of a goal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub result: Option<f64>,
}

impl CalculationStep {
    fn action(step: &str, action: String, result: Option<f64>) -> Self {
        Self {
            step: step.to_string(),
            action: Some(action),
            rule: None,
            result,
        }
    }

    fn nested(rule: String, result: f64) -> Self {
        Self {
            step: "Nested rule applied".to_string(),
            action: None,
            rule: Some(rule),
            result: Some(result),
        }
    }
}

/// Full record of evaluating one rule node, including its nested rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_name: String,
    pub rule_id: u64,
    pub applied: bool,
    /// Compound condition result after AND/OR chains.
    pub condition_met: bool,
    pub g2_goal: Option<f64>,
    pub source: Option<String>,
    pub calculation_path: Vec<CalculationStep>,
    pub null_fields: IndexSet<String>,
    pub condition: ConditionTrace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionTrace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_rules: Vec<RuleOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleOutcome {
    fn new(rule_name: &str, rule_id: u64) -> Self {
        Self {
            rule_name: rule_name.to_string(),
            rule_id,
            ..Default::default()
        }
    }
}

/// Evaluates rule nodes under one null-handling policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator {
    null_handling: NullHandling,
}

impl RuleEvaluator {
    pub fn new(null_handling: NullHandling) -> Self {
        Self { null_handling }
    }

    pub fn null_handling(&self) -> NullHandling {
        self.null_handling
    }

    /// Evaluate `node` against `source`.
    ///
    /// 1. The compound condition is evaluated.
    /// 2. If met and nothing blocks on nulls, the action runs.
    /// 3. If unmet, the else-action runs under the same null guard.
    /// 4. If unmet, nested rules run in order until one yields a goal; that
    ///    goal wins even over an else-action result.
    ///
    /// Failures are recorded in [`RuleOutcome::error`] and never propagate.
    pub fn process_rule<S: FieldSource + ?Sized>(
        &self,
        node: &RuleNode,
        source: &mut S,
        label: &str,
        rule_id: u64,
    ) -> RuleOutcome {
        self.process_at_depth(node, source, label, rule_id, 0)
    }

    fn process_at_depth<S: FieldSource + ?Sized>(
        &self,
        node: &RuleNode,
        source: &mut S,
        label: &str,
        rule_id: u64,
        depth: usize,
    ) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(label, rule_id);

        if depth > MAX_NESTING_DEPTH {
            let err = EvalError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            };
            warn!(rule = %label, rule_id, error = %err, "rule evaluation stopped");
            outcome.error = Some(err.to_string());
            return outcome;
        }

        let compound = evaluate_compound(&node.condition, source);
        let met = compound.met;
        outcome.condition_met = met;
        outcome.condition = compound.trace;
        outcome.null_fields = compound.null_fields;

        if met && self.allows(&outcome.null_fields) {
            self.run_branch(&node.action, false, source, &mut outcome);
        } else if !met && self.allows(&outcome.null_fields) {
            if let Some(else_action) = &node.else_action {
                self.run_branch(else_action, true, source, &mut outcome);
            }
        }

        if !met {
            for nested in &node.nested_rules {
                let child = self.process_at_depth(
                    nested,
                    source,
                    &format!("{label} (Nested)"),
                    rule_id,
                    depth + 1,
                );
                outcome.null_fields.extend(child.null_fields.iter().cloned());

                let produced = child.g2_goal;
                let child_name = child.rule_name.clone();
                let child_source = child.source.clone().unwrap_or_default();
                outcome.nested_rules.push(child);

                if let Some(goal) = produced {
                    outcome.g2_goal = Some(goal);
                    outcome.source = Some(format!("Nested rule -> {child_source}"));
                    outcome.calculation_path.push(CalculationStep::nested(child_name, goal));
                    outcome.applied = true;
                    break;
                }
            }
        }

        debug!(
            rule = %label,
            rule_id,
            met,
            applied = outcome.applied,
            g2_goal = ?outcome.g2_goal,
            "rule node evaluated"
        );
        outcome
    }

    /// Actions may run unless a null was seen under the flag policy.
    fn allows(&self, null_fields: &IndexSet<String>) -> bool {
        self.null_handling == NullHandling::Ignore || null_fields.is_empty()
    }

    fn run_branch<S: FieldSource + ?Sized>(
        &self,
        action: &Action,
        is_else: bool,
        source: &mut S,
        outcome: &mut RuleOutcome,
    ) {
        let description = action.to_string();
        match apply_action(action, source, self.null_handling) {
            Ok(result) => {
                outcome.null_fields.extend(result.null_fields.iter().cloned());
                outcome.action = Some(ActionTrace {
                    description: description.clone(),
                    applied: result.success,
                    is_else,
                    null_fields: result.null_fields,
                });
                if result.success {
                    let (step, prefix) = if is_else {
                        ("Else condition applied", "Else condition")
                    } else {
                        ("Main condition satisfied", "Main condition satisfied")
                    };
                    outcome.applied = true;
                    outcome.g2_goal = result.g2_goal;
                    outcome.source = Some(format!("{prefix} -> {description}"));
                    outcome
                        .calculation_path
                        .push(CalculationStep::action(step, description, result.g2_goal));
                }
            }
            Err(err) => {
                warn!(rule = %outcome.rule_name, error = %err, "action failed");
                outcome.action = Some(ActionTrace {
                    description,
                    applied: false,
                    is_else,
                    null_fields: IndexSet::new(),
                });
                outcome.error = Some(err.to_string());
            }
        }
    }
}
