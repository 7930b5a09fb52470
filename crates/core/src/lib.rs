//! Shared row model, field predicates, configuration and errors for goalset.

pub mod config;
pub mod document;
pub mod error;
pub mod fields;

pub use config::{Config, NullHandling};
pub use document::*;
pub use error::*;
