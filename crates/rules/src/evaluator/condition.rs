//! Condition evaluation: single comparisons and AND/OR chains.

use goalset_core::FieldValue;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::schema::{CompoundCondition, Condition, RightOperand};

use super::access::FieldSource;

/// Outcome of one comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionResult {
    pub met: bool,
    /// Fields that had no usable value. A non-empty set always means `met == false`.
    pub null_fields: IndexSet<String>,
}

/// Evaluate a single comparison against `source`.
///
/// A null operand column is recorded and makes the condition unmet. An
/// unparseable literal, a missing left column or an unknown operator is an
/// authoring problem: the condition is unmet and nothing is recorded.
pub fn evaluate_condition<S: FieldSource + ?Sized>(
    condition: &Condition,
    source: &S,
) -> ConditionResult {
    let mut result = ConditionResult::default();

    let Some(left_column) = condition.left() else {
        return result;
    };
    let Some(left) = source.lookup(left_column).value() else {
        result.null_fields.insert(left_column.to_string());
        return result;
    };

    let right = match condition.right_operand() {
        RightOperand::Literal(value) => match value.and_then(FieldValue::as_number) {
            Some(v) => v,
            None => return result,
        },
        RightOperand::Column(column) => match source.lookup(column).value() {
            Some(v) => v,
            None => {
                result.null_fields.insert(column.to_string());
                return result;
            }
        },
        RightOperand::Unresolved => return result,
    };

    result.met = condition
        .operator
        .as_ref()
        .map(|op| op.compare(left, right))
        .unwrap_or(false);
    result
}

// ── Traces ──────────────────────────────────────────────────────────

/// Trace of one AND/OR clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseTrace {
    pub description: String,
    pub met: bool,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub null_fields: IndexSet<String>,
}

/// Trace of a compound condition. `met` is the main comparison alone;
/// clauses only appear when their chain was evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionTrace {
    pub description: String,
    pub met: bool,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub null_fields: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and_conditions: Vec<ClauseTrace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or_conditions: Vec<ClauseTrace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundResult {
    pub met: bool,
    pub null_fields: IndexSet<String>,
    pub trace: ConditionTrace,
}

/// Evaluate the main comparison, then its AND chain while it holds, then the
/// OR chain if it does not.
///
/// Both chains short-circuit: AND stops at the first unmet clause (a null
/// operand counts as unmet), OR at the first met clause. Null fields from
/// every evaluated clause are collected.
pub fn evaluate_compound<S: FieldSource + ?Sized>(
    compound: &CompoundCondition,
    source: &S,
) -> CompoundResult {
    let main = evaluate_condition(&compound.base, source);
    let mut met = main.met;
    let mut null_fields = main.null_fields.clone();
    let mut trace = ConditionTrace {
        description: compound.base.to_string(),
        met: main.met,
        null_fields: main.null_fields,
        ..Default::default()
    };

    if met {
        for clause in &compound.and_conditions {
            let result = evaluate_condition(clause, source);
            null_fields.extend(result.null_fields.iter().cloned());
            let clause_met = result.met;
            trace.and_conditions.push(clause_trace(clause, result));
            if !clause_met {
                met = false;
                break;
            }
        }
    }

    if !met {
        for clause in &compound.or_conditions {
            let result = evaluate_condition(clause, source);
            null_fields.extend(result.null_fields.iter().cloned());
            let clause_met = result.met;
            trace.or_conditions.push(clause_trace(clause, result));
            if clause_met {
                met = true;
                break;
            }
        }
    }

    CompoundResult {
        met,
        null_fields,
        trace,
    }
}

fn clause_trace(clause: &Condition, result: ConditionResult) -> ClauseTrace {
    ClauseTrace {
        description: clause.to_string(),
        met: result.met,
        null_fields: result.null_fields,
    }
}
