//! Rule evaluation engine.
//!
//! Evaluation is layered bottom-up:
//! - [`access`]: numeric field lookups with goal-field defaulting
//! - [`condition`]: single comparisons and AND/OR compound chains
//! - [`action`]: arithmetic actions and goal write-back
//! - [`rule`]: the recursive rule-node evaluator producing [`RuleOutcome`]s
//! - [`processor`]: base/calculated orchestration per row
//! - [`tiers`]: G1/G3 derivation from G2
//!
//! Data problems (nulls, unparseable numbers) are never errors here; they
//! are tracked as null fields and resolved by the [`NullHandling`] policy.
//! Genuine failures inside a node are recorded on that node's outcome.
//!
//! [`NullHandling`]: goalset_core::NullHandling

pub mod access;
pub mod action;
pub mod condition;
pub mod processor;
pub mod rule;
pub mod tiers;

pub use access::{FieldSource, Lookup, RowContext};
pub use action::{apply_action, ActionResult, ActionTrace};
pub use condition::{
    evaluate_compound, evaluate_condition, ClauseTrace, CompoundResult, ConditionResult,
    ConditionTrace,
};
pub use processor::GoalProcessor;
pub use rule::{CalculationStep, RuleEvaluator, RuleOutcome};
pub use tiers::{derive_tiers, tier_bounds};

/// Rule trees nested deeper than this are cut off with an error.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Failures raised while evaluating a single rule node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("rule nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    #[error("action on '{column}' produced a non-finite value")]
    NonFinite { column: String },
}
