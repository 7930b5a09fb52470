//! Rule schema types with serde (de)serialization.
//!
//! The JSON shape is camelCase throughout so rule files written by earlier
//! tooling load unchanged:
//! - [`Condition`] / [`CompoundCondition`]: comparisons with AND/OR chains
//! - [`Action`]: the arithmetic applied when a node fires
//! - [`RuleNode`]: recursive condition → action / else / nested tree
//! - [`RuleDefinition`]: the base + calculated pair (legacy flat nodes accepted)
//! - [`StoredRule`] and the export document formats

mod action;
mod condition;
mod node;
mod stored;

pub use action::*;
pub use condition::*;
pub use node::*;
pub use stored::*;
