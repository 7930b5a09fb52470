//! Goal-tier field names and the predicates that classify column names.
//!
//! Every place that needs to know "is this a goal column" goes through here.

pub const G1_GOAL: &str = "G1_goal";
pub const G2_GOAL: &str = "G2_goal";
pub const G3_GOAL: &str = "G3_goal";

/// Synthetic field holding the base-rule result during a row pass.
/// Never written into a row.
pub const G2_CALCULATED: &str = "G2_calculated";

pub const GOAL_SUFFIX: &str = "_goal";

/// Sentinel for rows where nothing produced a goal.
pub const ALL_CONDITIONS_FAILED: &str = "All conditions failed";

/// Columns whose values are written back into the row by actions.
pub fn is_goal_field(field: &str) -> bool {
    field.ends_with(GOAL_SUFFIX)
}

pub fn is_calculated_goal(field: &str) -> bool {
    field == G2_CALCULATED
}

/// Lookups of goal-like fields default to zero when the value is absent.
pub fn defaults_to_zero(field: &str) -> bool {
    is_goal_field(field) || is_calculated_goal(field)
}

/// Whether a value written to `field` also counts as the row's G2 goal.
pub fn is_g2_target(field: &str) -> bool {
    field == G2_GOAL || field.contains("G2")
}

/// Goal sentinel strings are recognised by content, not by exact match.
pub fn is_sentinel(text: &str) -> bool {
    text.contains("is null") || text.contains("failed")
}

/// Round to two decimals, halves toward positive infinity.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
