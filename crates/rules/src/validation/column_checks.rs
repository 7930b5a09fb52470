//! Column reference checks against a dataset header.

use goalset_core::fields::{is_calculated_goal, is_goal_field};

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::schema::*;

pub(super) fn validate_columns<S: AsRef<str>>(
    def: &RuleDefinition,
    columns: &[S],
    result: &mut ValidationResult,
) {
    if let Some(base) = &def.base_rule {
        check_node(base, "baseRule", columns, result);
    }
    if let Some(calculated) = &def.calculated_rule {
        check_node(calculated, "calculatedRule", columns, result);
    }
}

fn check_node<S: AsRef<str>>(
    node: &RuleNode,
    path: &str,
    columns: &[S],
    result: &mut ValidationResult,
) {
    let condition_path = format!("{path}.condition");
    check_condition(&node.condition.base, &condition_path, columns, result);
    for (i, clause) in node.condition.and_conditions.iter().enumerate() {
        check_condition(clause, &format!("{condition_path}.andConditions[{i}]"), columns, result);
    }
    for (i, clause) in node.condition.or_conditions.iter().enumerate() {
        check_condition(clause, &format!("{condition_path}.orConditions[{i}]"), columns, result);
    }

    check_column(node.action.target(), &format!("{path}.action.column"), columns, result);
    if let Some(else_action) = &node.else_action {
        check_column(else_action.target(), &format!("{path}.elseAction.column"), columns, result);
    }

    for (i, nested) in node.nested_rules.iter().enumerate() {
        check_node(nested, &format!("{path}.nestedRules[{i}]"), columns, result);
    }
}

fn check_condition<S: AsRef<str>>(
    condition: &Condition,
    path: &str,
    columns: &[S],
    result: &mut ValidationResult,
) {
    check_column(condition.left(), &format!("{path}.leftColumn"), columns, result);
    if let RightOperand::Column(right) = condition.right_operand() {
        check_column(Some(right), &format!("{path}.rightColumn"), columns, result);
    }
}

fn check_column<S: AsRef<str>>(
    column: Option<&str>,
    path: &str,
    columns: &[S],
    result: &mut ValidationResult,
) {
    let Some(column) = column else { return };
    if is_goal_field(column) || is_calculated_goal(column) {
        return;
    }
    if columns.iter().any(|c| c.as_ref() == column) {
        return;
    }

    let message = match fuzzy_match(column, columns) {
        Some(s) => format!("Column '{column}' is not in the data; did you mean '{s}'?"),
        None => format!("Column '{column}' is not in the data"),
    };
    result.warn(path, message);
}
