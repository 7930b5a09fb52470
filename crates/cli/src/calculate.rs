//! `goalset calculate`: import, calculate, export.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use goalset_core::config::{Config, GoalConfig};
use goalset_ingest::{csv_export, CsvImporter, Dataset};
use goalset_rules::store::RuleStore;
use goalset_rules::GoalProcessor;
use tracing::info;

use crate::cli::CalculateArgs;
use crate::report;

pub fn run(config: &Config, args: CalculateArgs) -> Result<()> {
    let goals = GoalConfig {
        bps_threshold: args.threshold.unwrap_or(config.goals.bps_threshold),
        null_handling: args.null_handling.unwrap_or(config.goals.null_handling),
    };

    let parts = args
        .data
        .iter()
        .map(|path| {
            CsvImporter::import(path)
                .with_context(|| format!("failed to import {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut dataset = Dataset::merge(parts);
    let process_column = args
        .process_column
        .clone()
        .or_else(|| config.data.process_column.clone());
    if let Some(column) = process_column {
        if !dataset.columns.contains(&column) {
            bail!("process column '{column}' is not in the data");
        }
        dataset.process_column = column;
    }
    if !args.processes.is_empty() {
        dataset = dataset.filter_processes(args.processes.as_slice());
    }
    if dataset.rows.is_empty() {
        bail!("no rows to calculate");
    }

    let rules_path = args.rules.as_deref().unwrap_or(config.data.rules_path.as_path());
    let store = RuleStore::open(rules_path)
        .with_context(|| format!("failed to load rules from {}", rules_path.display()))?;
    if store.is_empty() {
        bail!("no rules in {}", rules_path.display());
    }
    let selected = store.select(args.select.as_slice()).context("invalid rule selection")?;

    let processor = GoalProcessor::new(goals).with_process_column(dataset.process_column.as_str());
    let mut rows = dataset.rows;
    let trail = processor.process(&mut rows, store.rules(), &selected);
    info!(rows = rows.len(), rules = selected.len(), "calculation finished");

    match &args.output {
        Some(path) => {
            let today = Utc::now().date_naive();
            csv_export::write_results(create(path)?, &rows, &goals, today)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => report::print_goals(&mut io::stdout().lock(), &dataset.process_column, &rows)?,
    }
    if let Some(path) = &args.details {
        csv_export::write_details(create(path)?, &trail)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.audit {
        csv_export::write_audit(create(path)?, &trail)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
