//! Plain-text tables for the terminal.

use std::io::Write;

use anyhow::Result;
use goalset_core::fields::{G1_GOAL, G2_GOAL, G3_GOAL};
use goalset_core::{FieldValue, Row};
use goalset_rules::schema::StoredRule;
use goalset_rules::validation::ValidationResult;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn cell(row: &Row, field: &str) -> String {
    row.get(field).map(FieldValue::to_string).unwrap_or_default()
}

/// One line per row: process, then G2, G1 and G3.
pub fn print_goals<W: Write>(out: &mut W, process_column: &str, rows: &[Row]) -> Result<()> {
    writeln!(out, "{:<24} {:>16} {:>16} {:>16}", "PROCESS", "G2", "G1", "G3")?;
    writeln!(out, "{}", "-".repeat(75))?;
    for row in rows {
        writeln!(
            out,
            "{:<24} {:>16} {:>16} {:>16}",
            clip(&cell(row, process_column), 24),
            clip(&cell(row, G2_GOAL), 16),
            clip(&cell(row, G1_GOAL), 16),
            clip(&cell(row, G3_GOAL), 16),
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn print_rules<W: Write>(out: &mut W, rules: &[StoredRule]) -> Result<()> {
    if rules.is_empty() {
        writeln!(out, "No rules stored.")?;
        return Ok(());
    }

    writeln!(out, "{:<14} {:<30} {:<44} DESCRIPTION", "ID", "NAME", "SHAPE")?;
    writeln!(out, "{}", "-".repeat(100))?;
    for rule in rules {
        writeln!(
            out,
            "{:<14} {:<30} {:<44} {}",
            rule.id,
            clip(&rule.name, 30),
            clip(&rule.rule.complexity(), 44),
            rule.description,
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Errors first, then warnings, each with its path.
pub fn print_validation<W: Write>(
    out: &mut W,
    name: &str,
    result: &ValidationResult,
) -> Result<()> {
    let status = if result.valid { "ok" } else { "invalid" };
    writeln!(
        out,
        "{name}: {status} ({} errors, {} warnings)",
        result.errors.len(),
        result.warnings.len()
    )?;
    for error in &result.errors {
        write!(out, "  error   {}: {}", error.path, error.message)?;
        match &error.suggestion {
            Some(suggestion) => writeln!(out, " ({suggestion})")?,
            None => writeln!(out)?,
        }
    }
    for warning in &result.warnings {
        writeln!(out, "  warning {}: {}", warning.path, warning.message)?;
    }
    Ok(())
}
