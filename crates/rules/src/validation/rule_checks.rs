//! Structural checks on rule definitions: conditions, actions, else
//! branches and nested chains.

use goalset_core::FieldValue;

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::evaluator::MAX_NESTING_DEPTH;
use crate::schema::*;

// ── Definitions ─────────────────────────────────────────────────────

pub(super) fn validate_definition(
    def: &RuleDefinition,
    prefix: &str,
    result: &mut ValidationResult,
) {
    let base_path = join(prefix, "baseRule");
    match &def.base_rule {
        None if def.calculated_rule.is_none() => {
            result.error(base_path, "A base rule or a calculated rule is required")
        }
        None => result.warn(
            base_path,
            "No base rule; the calculated rule only sees G2_calculated from earlier rules",
        ),
        Some(base) => {
            if base.uses_calculated_goal() {
                result.warn(
                    format!("{base_path}.condition"),
                    "G2_calculated is only produced for calculated rules; in a base rule it reads as 0",
                );
            }
            validate_node(base, &base_path, result);
        }
    }

    if let Some(calculated) = &def.calculated_rule {
        validate_node(calculated, &join(prefix, "calculatedRule"), result);
    }
}

fn validate_node(node: &RuleNode, path: &str, result: &mut ValidationResult) {
    let depth = node.nesting_depth();
    if depth > MAX_NESTING_DEPTH {
        result.warn(
            format!("{path}.nestedRules"),
            format!("Nested rules go {depth} levels deep; evaluation stops at {MAX_NESTING_DEPTH}"),
        );
    }
    check_node(node, path, result);
}

fn check_node(node: &RuleNode, path: &str, result: &mut ValidationResult) {
    let condition_path = format!("{path}.condition");
    validate_condition(&node.condition.base, &condition_path, result);
    for (i, clause) in node.condition.and_conditions.iter().enumerate() {
        validate_condition(clause, &format!("{condition_path}.andConditions[{i}]"), result);
    }
    for (i, clause) in node.condition.or_conditions.iter().enumerate() {
        validate_condition(clause, &format!("{condition_path}.orConditions[{i}]"), result);
    }

    validate_action(&node.action, &format!("{path}.action"), result);
    if let Some(else_action) = &node.else_action {
        validate_action(else_action, &format!("{path}.elseAction"), result);
    }

    for (i, nested) in node.nested_rules.iter().enumerate() {
        check_node(nested, &format!("{path}.nestedRules[{i}]"), result);
    }
}

// ── Conditions ──────────────────────────────────────────────────────

fn validate_condition(condition: &Condition, path: &str, result: &mut ValidationResult) {
    if condition.left().is_none() {
        result.error(format!("{path}.leftColumn"), "Left column is required");
    }

    match &condition.operator {
        None => result.error(format!("{path}.operator"), "Operator is required"),
        Some(Operator::Other(symbol)) => {
            let message = format!("Unknown operator '{symbol}'");
            match fuzzy_match(symbol, OPERATOR_SYMBOLS) {
                Some(s) => result.error_with_suggestion(
                    format!("{path}.operator"),
                    message,
                    format!("Did you mean '{s}'?"),
                ),
                None => result.error(
                    format!("{path}.operator"),
                    format!("{message}; expected one of {}", OPERATOR_SYMBOLS.join(", ")),
                ),
            }
        }
        Some(_) => {}
    }

    match condition.right_operand() {
        RightOperand::Literal(value) => {
            let value_path = format!("{path}.rightValue");
            if is_blank(value) {
                result.error(value_path, "A comparison value is required");
            } else if value.and_then(FieldValue::as_number).is_none() {
                result.warn(
                    value_path,
                    "Comparison value is not numeric; the condition can never be met",
                );
            }
        }
        RightOperand::Column(_) => {}
        RightOperand::Unresolved => {
            result.error(format!("{path}.rightColumn"), "A comparison column is required");
        }
    }
}

// ── Actions ─────────────────────────────────────────────────────────

fn validate_action(action: &Action, path: &str, result: &mut ValidationResult) {
    if action.target().is_none() {
        result.error(format!("{path}.column"), "Action column is required");
    }

    let Some(action_type) = &action.action_type else {
        result.error(format!("{path}.type"), "Action type is required");
        return;
    };

    if let ActionType::Other(name) = action_type {
        let message = format!("Unknown action type '{name}'");
        match fuzzy_match(name, ACTION_TYPE_NAMES) {
            Some(s) => result.error_with_suggestion(
                format!("{path}.type"),
                message,
                format!("Did you mean '{s}'?"),
            ),
            None => result.error(
                format!("{path}.type"),
                format!("{message}; expected one of {}", ACTION_TYPE_NAMES.join(", ")),
            ),
        }
        return;
    }

    if !action_type.takes_operand() {
        return;
    }

    let value_path = format!("{path}.value");
    let value = action.value.as_ref();
    if is_blank(value) {
        result.error(value_path, "Action value is required");
        return;
    }
    match value.and_then(FieldValue::as_number) {
        None => result.warn(value_path, "Action value is not numeric and will be treated as 0"),
        Some(v) if v == 0.0 && *action_type == ActionType::Divide => {
            result.warn(value_path, "Division by zero leaves the column unchanged");
        }
        Some(_) => {}
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn is_blank(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Text(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
