//! Numeric field lookups against a row.

use goalset_core::fields::{defaults_to_zero, is_calculated_goal};
use goalset_core::Row;

/// Result of reading a field as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    Numeric(f64),
    /// Absent goal-like field, read as this value (always zero).
    Defaulted(f64),
    /// Absent, explicitly null, or not numeric.
    Null,
}

impl Lookup {
    pub fn value(self) -> Option<f64> {
        match self {
            Lookup::Numeric(v) | Lookup::Defaulted(v) => Some(v),
            Lookup::Null => None,
        }
    }

    pub fn is_null(self) -> bool {
        matches!(self, Lookup::Null)
    }
}

/// Read `field` from a row.
///
/// Missing goal-tier fields and the synthetic calculated-goal field default
/// to zero; everything else missing or unparseable is [`Lookup::Null`].
pub fn lookup(row: &Row, field: &str) -> Lookup {
    match row.get(field) {
        None => missing(field),
        Some(value) if value.is_null() => missing(field),
        Some(value) => value.as_number().map(Lookup::Numeric).unwrap_or(Lookup::Null),
    }
}

fn missing(field: &str) -> Lookup {
    if defaults_to_zero(field) {
        Lookup::Defaulted(0.0)
    } else {
        Lookup::Null
    }
}

/// What the evaluator reads from and writes goals into.
pub trait FieldSource {
    fn lookup(&self, field: &str) -> Lookup;

    /// Store a computed goal-tier value.
    fn write_goal(&mut self, field: &str, value: f64);
}

impl FieldSource for Row {
    fn lookup(&self, field: &str) -> Lookup {
        lookup(self, field)
    }

    fn write_goal(&mut self, field: &str, value: f64) {
        self.set(field, value);
    }
}

/// Per-row evaluation context.
///
/// Overlays the working `G2_calculated` value on top of the row without
/// writing it into the row itself, so it cannot leak into output or into
/// the next row.
pub struct RowContext<'a> {
    row: &'a mut Row,
    calculated_goal: Option<f64>,
}

impl<'a> RowContext<'a> {
    pub fn new(row: &'a mut Row) -> Self {
        Self {
            row,
            calculated_goal: None,
        }
    }

    pub fn set_calculated_goal(&mut self, value: f64) {
        self.calculated_goal = Some(value);
    }

    pub fn calculated_goal(&self) -> Option<f64> {
        self.calculated_goal
    }

    pub fn row(&self) -> &Row {
        self.row
    }
}

impl FieldSource for RowContext<'_> {
    fn lookup(&self, field: &str) -> Lookup {
        if is_calculated_goal(field) {
            if let Some(value) = self.calculated_goal {
                return Lookup::Numeric(value);
            }
        }
        lookup(self.row, field)
    }

    fn write_goal(&mut self, field: &str, value: f64) {
        self.row.set(field, value);
    }
}

#[cfg(test)]
mod tests {
    use goalset_core::FieldValue;

    use super::*;

    fn row() -> Row {
        Row::from_iter([
            ("Revenue", FieldValue::Number(120.0)),
            ("Label", FieldValue::Text("n/a".into())),
            ("Padded", FieldValue::Text(" 15.5 units".into())),
            ("Empty", FieldValue::Null),
            ("G1_goal", FieldValue::Null),
        ])
    }

    #[test]
    fn numeric_and_text_values() {
        let row = row();
        assert_eq!(lookup(&row, "Revenue"), Lookup::Numeric(120.0));
        assert_eq!(lookup(&row, "Padded"), Lookup::Numeric(15.5));
        assert_eq!(lookup(&row, "Label"), Lookup::Null);
    }

    #[test]
    fn missing_generic_field_is_null() {
        let row = row();
        assert_eq!(lookup(&row, "Absent"), Lookup::Null);
        assert_eq!(lookup(&row, "Empty"), Lookup::Null);
    }

    #[test]
    fn missing_goal_fields_default_to_zero() {
        let row = row();
        assert_eq!(lookup(&row, "G2_goal"), Lookup::Defaulted(0.0));
        assert_eq!(lookup(&row, "G1_goal"), Lookup::Defaulted(0.0));
        assert_eq!(lookup(&row, "G2_calculated"), Lookup::Defaulted(0.0));
    }

    #[test]
    fn unparseable_goal_field_is_still_null() {
        let row = Row::from_iter([("G2_goal", "pending")]);
        assert_eq!(lookup(&row, "G2_goal"), Lookup::Null);
    }

    #[test]
    fn context_overlays_calculated_goal_without_touching_row() {
        let mut row = row();
        let mut ctx = RowContext::new(&mut row);
        assert_eq!(ctx.lookup("G2_calculated"), Lookup::Defaulted(0.0));

        ctx.set_calculated_goal(42.0);
        assert_eq!(ctx.lookup("G2_calculated"), Lookup::Numeric(42.0));
        assert!(!ctx.row().contains("G2_calculated"));

        ctx.write_goal("G1_goal", 7.0);
        assert_eq!(row.get("G1_goal"), Some(&FieldValue::Number(7.0)));
    }
}
