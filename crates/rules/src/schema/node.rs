//! Recursive rule nodes and the two-phase rule definition.

use goalset_core::fields::G2_CALCULATED;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::action::Action;
use super::condition::{null_as_default, CompoundCondition};

/// One node of a rule tree.
///
/// When the condition holds, `action` runs; otherwise `else_action` runs and
/// the `nested_rules` are tried in order as a fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleNode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub condition: CompoundCondition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_action: Option<Action>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub nested_rules: Vec<RuleNode>,
}

impl RuleNode {
    pub fn new(condition: impl Into<CompoundCondition>, action: Action) -> Self {
        Self {
            condition: condition.into(),
            action,
            else_action: None,
            nested_rules: Vec::new(),
        }
    }

    pub fn with_else(mut self, action: Action) -> Self {
        self.else_action = Some(action);
        self
    }

    pub fn with_nested(mut self, node: RuleNode) -> Self {
        self.nested_rules.push(node);
        self
    }

    /// Whether the condition tree of this node (main, AND and OR clauses)
    /// reads the synthetic calculated-goal field. Nested rules are not inspected.
    pub fn uses_calculated_goal(&self) -> bool {
        self.condition.references(G2_CALCULATED)
    }

    /// Depth of the deepest nested chain below this node (0 = no nesting).
    pub fn nesting_depth(&self) -> usize {
        self.nested_rules
            .iter()
            .map(|n| 1 + n.nesting_depth())
            .max()
            .unwrap_or(0)
    }
}

/// A stored rule body: a base rule over raw data and an optional calculated
/// rule that may read the base result through `G2_calculated`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub base_rule: Option<RuleNode>,
    pub calculated_rule: Option<RuleNode>,
}

impl RuleDefinition {
    pub fn base(node: RuleNode) -> Self {
        Self {
            base_rule: Some(node),
            calculated_rule: None,
        }
    }

    pub fn with_calculated(mut self, node: RuleNode) -> Self {
        self.calculated_rule = Some(node);
        self
    }

    /// One-line summary of the definition's shape, parts joined by ` • `.
    pub fn complexity(&self) -> String {
        let mut parts = Vec::new();
        if let Some(base) = &self.base_rule {
            parts.push("Base Rule".to_string());
            let clauses = base.condition.clause_count();
            if clauses > 1 {
                parts.push(format!("{clauses} conditions"));
            }
            if base.else_action.is_some() {
                parts.push("Else action".to_string());
            }
            match base.nested_rules.len() {
                0 => {}
                1 => parts.push("1 nested rule".to_string()),
                n => parts.push(format!("{n} nested rules")),
            }
        }
        if self.calculated_rule.is_some() {
            parts.push("Calculated Rule".to_string());
        }
        if parts.is_empty() {
            "Simple rule".to_string()
        } else {
            parts.join(" • ")
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TieredDefinition {
    #[serde(default)]
    base_rule: Option<RuleNode>,
    #[serde(default)]
    calculated_rule: Option<RuleNode>,
}

impl<'de> Deserialize<'de> for RuleDefinition {
    /// Accepts `{baseRule, calculatedRule}` as well as a bare legacy node,
    /// which becomes the base rule.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tiered = value.get("baseRule").is_some() || value.get("calculatedRule").is_some();
        if tiered {
            let def: TieredDefinition = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Self {
                base_rule: def.base_rule,
                calculated_rule: def.calculated_rule,
            })
        } else if value.get("condition").is_some() {
            let node: RuleNode = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Self::base(node))
        } else if value.is_object() {
            Ok(Self::default())
        } else {
            Err(D::Error::custom("rule definition must be an object"))
        }
    }
}
