//! Conditional goal rules and the engine that applies them.
//!
//! This crate provides:
//! - JSON/YAML rule schema with AND/OR conditions, else actions and nested
//!   fallback rules, split into a base and a calculated phase
//! - The evaluator and goal processor producing G1/G2/G3 goals per row
//! - Per-row audit trails of every evaluated rule
//! - Rule validation with "did you mean" suggestions
//! - A rule store with import/export and file persistence

pub mod audit_log;
pub mod evaluator;
pub mod schema;
pub mod store;
pub mod validation;

pub use audit_log::{AuditTrail, ProcessAudit};
pub use evaluator::GoalProcessor;
pub use store::{RuleError, RuleStore};
