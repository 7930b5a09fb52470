//! Comparison conditions and their AND/OR compound form.

use std::fmt;

use goalset_core::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};

/// Comparison operators. Anything unrecognised is kept verbatim so it can be
/// reported by validation and round-trips through storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
    Other(String),
}

/// Operator symbols accepted on input.
pub const OPERATOR_SYMBOLS: &[&str] = &[">", "<", "=", "==", ">=", "<=", "!="];

impl Operator {
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            "=" | "==" => Operator::Eq,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "!=" => Operator::Ne,
            other => Operator::Other(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Ne => "!=",
            Operator::Other(s) => s,
        }
    }

    /// Numeric comparison. Unknown operators never match.
    pub fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            Operator::Gt => left > right,
            Operator::Lt => left < right,
            Operator::Eq => left == right,
            Operator::Ge => left >= right,
            Operator::Le => left <= right,
            Operator::Ne => left != right,
            Operator::Other(_) => false,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Operator::parse(&s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How the right-hand side of a condition resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RightOperand<'a> {
    /// Literal from `rightValue` (`rightType` of `value` or `custom`).
    Literal(Option<&'a FieldValue>),
    /// Another column of the same row.
    Column(&'a str),
    /// Column comparison without a column name.
    Unresolved,
}

/// A single comparison: `leftColumn operator right`.
///
/// Fields are optional because rules are user-authored; validation reports
/// what is missing and evaluation treats an incomplete condition as unmet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// `value`, `custom`, `column`; older files stored the column name here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_column: Option<String>,
}

impl Condition {
    /// Literal comparison against a constant.
    pub fn value(left: &str, operator: &str, right: impl Into<FieldValue>) -> Self {
        Self {
            left_column: Some(left.to_string()),
            operator: Some(Operator::parse(operator)),
            right_type: Some("value".to_string()),
            right_value: Some(right.into()),
            right_column: None,
        }
    }

    /// Comparison against another column.
    pub fn column(left: &str, operator: &str, right: &str) -> Self {
        Self {
            left_column: Some(left.to_string()),
            operator: Some(Operator::parse(operator)),
            right_type: Some("column".to_string()),
            right_value: None,
            right_column: Some(right.to_string()),
        }
    }

    pub fn left(&self) -> Option<&str> {
        non_empty(self.left_column.as_deref())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.right_type.as_deref(), Some("value") | Some("custom"))
    }

    pub fn right_operand(&self) -> RightOperand<'_> {
        if self.is_literal() {
            return RightOperand::Literal(self.right_value.as_ref());
        }
        let column = non_empty(self.right_column.as_deref());
        let fallback = match self.right_type.as_deref() {
            Some("column") => None,
            other => non_empty(other),
        };
        match column.or(fallback) {
            Some(name) => RightOperand::Column(name),
            None => RightOperand::Unresolved,
        }
    }

    /// Whether either side names `field` as a column.
    pub fn references(&self, field: &str) -> bool {
        self.left_column.as_deref() == Some(field) || self.right_column.as_deref() == Some(field)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left = self.left().unwrap_or("?");
        let operator = self.operator.as_ref().map(|o| o.symbol()).unwrap_or("?");
        let right = if self.is_literal() {
            display_or(self.right_value.as_ref(), "0")
        } else {
            non_empty(self.right_column.as_deref())
                .or_else(|| non_empty(self.right_type.as_deref()))
                .unwrap_or("?")
                .to_string()
        };
        write!(f, "{left} {operator} {right}")
    }
}

/// A main condition with an AND chain and an OR fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundCondition {
    #[serde(flatten)]
    pub base: Condition,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub and_conditions: Vec<Condition>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub or_conditions: Vec<Condition>,
}

impl CompoundCondition {
    pub fn all(&self) -> impl Iterator<Item = &Condition> {
        std::iter::once(&self.base)
            .chain(self.and_conditions.iter())
            .chain(self.or_conditions.iter())
    }

    pub fn references(&self, field: &str) -> bool {
        self.all().any(|c| c.references(field))
    }

    pub fn clause_count(&self) -> usize {
        1 + self.and_conditions.len() + self.or_conditions.len()
    }
}

impl From<Condition> for CompoundCondition {
    fn from(base: Condition) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Render an authored operand, substituting `fallback` for blank values.
pub(crate) fn display_or(value: Option<&FieldValue>, fallback: &str) -> String {
    match value {
        None | Some(FieldValue::Null) | Some(FieldValue::Boolean(false)) => fallback.to_string(),
        Some(FieldValue::Number(n)) if *n == 0.0 => fallback.to_string(),
        Some(FieldValue::Text(s)) if s.is_empty() => fallback.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
