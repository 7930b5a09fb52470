//! Action application: arithmetic on a column and goal write-back.

use goalset_core::fields::{is_g2_target, is_goal_field, round2};
use goalset_core::NullHandling;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schema::{Action, ActionType};

use super::access::FieldSource;
use super::EvalError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    /// Rounded result of the arithmetic.
    pub value: Option<f64>,
    /// Value that counts toward the row's G2 goal, if any.
    pub g2_goal: Option<f64>,
    pub null_fields: IndexSet<String>,
}

/// Trace of the action (or else-action) a node ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTrace {
    pub description: String,
    pub applied: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_else: bool,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub null_fields: IndexSet<String>,
}

/// Apply `action` to the current value of its column.
///
/// Results are rounded to two decimals. Goal-tier columns (`*_goal`) are
/// written back through `source`; only the G2 tier propagates as a goal.
/// Any other column is left untouched and its computed value becomes the
/// goal candidate. Dividing by zero leaves the value unchanged.
pub fn apply_action<S: FieldSource + ?Sized>(
    action: &Action,
    source: &mut S,
    null_handling: NullHandling,
) -> Result<ActionResult, EvalError> {
    let mut result = ActionResult::default();

    let Some(column) = action.target() else {
        return Ok(result);
    };

    let current = match source.lookup(column).value() {
        Some(v) => v,
        None => {
            result.null_fields.insert(column.to_string());
            match null_handling {
                NullHandling::Flag => return Ok(result),
                NullHandling::Ignore => 0.0,
            }
        }
    };

    let Some(action_type) = &action.action_type else {
        return Ok(result);
    };
    let operand = action.operand();

    let computed = match action_type {
        ActionType::Value => operand,
        ActionType::Add => current + operand,
        ActionType::Subtract => current - operand,
        ActionType::PercentIncrease => current * (1.0 + operand / 100.0),
        ActionType::PercentDecrease => current * (1.0 - operand / 100.0),
        ActionType::Multiply => current * operand,
        ActionType::Divide => {
            if operand == 0.0 {
                warn!(column, "divide by zero prevented, value left unchanged");
                current
            } else {
                current / operand
            }
        }
        ActionType::Reset => 0.0,
        ActionType::Other(_) => return Ok(result),
    };

    let value = round2(computed);
    if !value.is_finite() {
        return Err(EvalError::NonFinite {
            column: column.to_string(),
        });
    }

    if is_goal_field(column) {
        source.write_goal(column, value);
        if is_g2_target(column) {
            result.g2_goal = Some(value);
        }
    } else {
        result.g2_goal = Some(value);
    }

    result.success = true;
    result.value = Some(value);
    Ok(result)
}
