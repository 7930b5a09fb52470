//! Stored-rule lifecycle: save, duplicate, delete, import/export and
//! JSON/YAML persistence.
//!
//! The on-disk store is an export document, so a store file can be handed
//! to `import` elsewhere unchanged.

mod core;
mod error;
mod transfer;

#[cfg(test)]
mod tests;

pub use self::core::{FileFormat, RuleStore};
pub use self::error::{Result, RuleError};
pub use self::transfer::{
    parse_rules, sanitize_filename, ImportMode, ImportSummary, EXPORT_FILE_NAME,
};
