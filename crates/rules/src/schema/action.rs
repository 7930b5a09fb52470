use std::fmt;

use goalset_core::FieldValue;
use serde::{Deserialize, Serialize};

use super::condition::display_or;

/// Arithmetic applied to a column when a rule node fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Value,
    Add,
    Subtract,
    PercentIncrease,
    PercentDecrease,
    Multiply,
    Divide,
    Reset,
    Other(String),
}

pub const ACTION_TYPE_NAMES: &[&str] = &[
    "value",
    "add",
    "subtract",
    "percent-increase",
    "percent-decrease",
    "multiply",
    "divide",
    "reset",
];

impl ActionType {
    pub fn parse(name: &str) -> Self {
        match name {
            "value" => ActionType::Value,
            "add" => ActionType::Add,
            "subtract" => ActionType::Subtract,
            "percent-increase" => ActionType::PercentIncrease,
            "percent-decrease" => ActionType::PercentDecrease,
            "multiply" => ActionType::Multiply,
            "divide" => ActionType::Divide,
            "reset" => ActionType::Reset,
            other => ActionType::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ActionType::Value => "value",
            ActionType::Add => "add",
            ActionType::Subtract => "subtract",
            ActionType::PercentIncrease => "percent-increase",
            ActionType::PercentDecrease => "percent-decrease",
            ActionType::Multiply => "multiply",
            ActionType::Divide => "divide",
            ActionType::Reset => "reset",
            ActionType::Other(s) => s,
        }
    }

    /// Every known type except `reset` consumes an operand.
    pub fn takes_operand(&self) -> bool {
        !matches!(self, ActionType::Reset)
    }
}

impl From<String> for ActionType {
    fn from(s: String) -> Self {
        ActionType::parse(&s)
    }
}

impl From<ActionType> for String {
    fn from(t: ActionType) -> Self {
        t.name().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    /// Operand; stored as text or number depending on who wrote the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl Action {
    pub fn new(column: &str, action_type: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            column: Some(column.to_string()),
            action_type: Some(ActionType::parse(action_type)),
            value: Some(value.into()),
        }
    }

    pub fn reset(column: &str) -> Self {
        Self {
            column: Some(column.to_string()),
            action_type: Some(ActionType::Reset),
            value: None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.column.as_deref().filter(|c| !c.is_empty())
    }

    /// Numeric operand; anything unparseable counts as zero.
    pub fn operand(&self) -> f64 {
        self.value.as_ref().and_then(FieldValue::as_number).unwrap_or(0.0)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self.target().unwrap_or("?");
        let value = self.value.as_ref();
        match &self.action_type {
            Some(ActionType::Value) => write!(f, "Set {column} = {}", display_or(value, "0")),
            Some(ActionType::Add) => write!(f, "{column} + {}", display_or(value, "0")),
            Some(ActionType::Subtract) => write!(f, "{column} - {}", display_or(value, "0")),
            Some(ActionType::PercentIncrease) => {
                write!(f, "{column} × (1 + {}%)", display_or(value, "0"))
            }
            Some(ActionType::PercentDecrease) => {
                write!(f, "{column} × (1 - {}%)", display_or(value, "0"))
            }
            Some(ActionType::Multiply) => write!(f, "{column} × {}", display_or(value, "1")),
            Some(ActionType::Divide) => write!(f, "{column} ÷ {}", display_or(value, "1")),
            Some(ActionType::Reset) => write!(f, "{column} = 0"),
            Some(ActionType::Other(name)) => {
                write!(f, "{name} {column} {}", display_or(value, ""))
            }
            None => write!(f, "? {column} {}", display_or(value, "")),
        }
    }
}
