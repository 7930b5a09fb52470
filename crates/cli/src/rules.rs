//! `goalset rules ...`: rule store management.
//!
//! Every mutating command loads the store, applies one change and writes the
//! whole store back.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use goalset_ingest::CsvImporter;
use goalset_rules::schema::{RuleDefinition, StoredRule};
use goalset_rules::store::{FileFormat, RuleStore, EXPORT_FILE_NAME};
use goalset_rules::validation::{validate_against_columns, validate_stored_rule};
use serde::Serialize;
use tracing::info;

use crate::cli::RulesCommand;
use crate::report;

pub fn run(path: &Path, command: RulesCommand) -> Result<()> {
    let mut store = RuleStore::open(path)
        .with_context(|| format!("failed to open rule store {}", path.display()))?;
    let mut stdout = io::stdout().lock();

    match command {
        RulesCommand::List => report::print_rules(&mut stdout, store.rules())?,

        RulesCommand::Show { rule } => {
            let found = resolve(&store, &rule)?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(found)?)?;
        }

        RulesCommand::Add { name, description, file } => {
            let definition = read_definition(&file)?;
            let id = store.save(&name, &description, definition)?;
            store.save_file(path)?;
            writeln!(stdout, "Saved rule '{name}' ({id})")?;
        }

        RulesCommand::Validate { rules, data } => {
            let columns = match &data {
                Some(csv) => Some(
                    CsvImporter::import(csv)
                        .with_context(|| format!("failed to read {}", csv.display()))?
                        .columns,
                ),
                None => None,
            };
            let ids = store.select(rules.as_slice())?;

            let mut invalid = 0usize;
            for id in ids {
                let Some(rule) = store.get(id) else { continue };
                let mut result = validate_stored_rule(rule);
                if let Some(columns) = &columns {
                    let by_column = validate_against_columns(&rule.rule, columns.as_slice());
                    result.warnings.extend(
                        by_column
                            .warnings
                            .into_iter()
                            .filter(|w| w.message.starts_with("Column ")),
                    );
                }
                if !result.valid {
                    invalid += 1;
                }
                report::print_validation(&mut stdout, &rule.name, &result)?;
            }
            if invalid > 0 {
                bail!("{invalid} invalid rule(s)");
            }
        }

        RulesCommand::Import { file, mode } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = store.import(&text, FileFormat::from_path(&file), mode)?;
            store.save_file(path)?;
            writeln!(
                stdout,
                "Imported {} rule(s) ({}), {} skipped",
                summary.imported,
                summary.mode,
                summary.skipped.len()
            )?;
            for name in &summary.skipped {
                writeln!(stdout, "  skipped '{name}': name already stored")?;
            }
        }

        RulesCommand::Export { rule, output } => match rule {
            Some(key) => {
                let id = resolve(&store, &key)?.id;
                let (file_name, doc) = store.export_single(id)?;
                write_document(&mut stdout, output, &file_name, &doc)?;
            }
            None => {
                let doc = store.export()?;
                write_document(&mut stdout, output, EXPORT_FILE_NAME, &doc)?;
            }
        },

        RulesCommand::Duplicate { rule } => {
            let id = resolve(&store, &rule)?.id;
            let copy = store.duplicate(id)?;
            store.save_file(path)?;
            let name = store.get(copy).map(|r| r.name.as_str()).unwrap_or_default();
            writeln!(stdout, "Created '{name}' ({copy})")?;
        }

        RulesCommand::Delete { rule } => {
            let id = resolve(&store, &rule)?.id;
            let removed = store.delete(id)?;
            store.save_file(path)?;
            writeln!(stdout, "Deleted '{}' ({})", removed.name, removed.id)?;
        }
    }

    Ok(())
}

fn resolve<'a>(store: &'a RuleStore, key: &str) -> Result<&'a StoredRule> {
    store.find(key).ok_or_else(|| anyhow!("no rule with id or name '{key}'"))
}

/// Read a rule body; the format follows the file extension.
fn read_definition(file: &Path) -> Result<RuleDefinition> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let definition = match FileFormat::from_path(file) {
        FileFormat::Json => serde_json::from_str(&text)?,
        FileFormat::Yaml => serde_yaml::from_str(&text)?,
    };
    Ok(definition)
}

/// Print to stdout, or write to `output`. A directory output gets the
/// document's conventional file name.
fn write_document<W: Write, T: Serialize>(
    stdout: &mut W,
    output: Option<PathBuf>,
    file_name: &str,
    doc: &T,
) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)?;
    let Some(output) = output else {
        writeln!(stdout, "{json}")?;
        return Ok(());
    };

    let target = if output.is_dir() { output.join(file_name) } else { output };
    fs::write(&target, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), "exported rules");
    writeln!(stdout, "Wrote {}", target.display())?;
    Ok(())
}
