//! Results export: the goal sheet, the rule-application details sheet and
//! the audit trail document.

use std::io::Write;

use chrono::NaiveDate;
use goalset_core::config::GoalConfig;
use goalset_core::fields::{G1_GOAL, G3_GOAL};
use goalset_core::{FieldValue, Row};
use goalset_rules::AuditTrail;
use indexmap::IndexSet;
use tracing::debug;

use crate::error::Result;

/// Columns appended to every row of the results sheet.
pub const RESULT_META_COLUMNS: [&str; 3] =
    ["BPS_Threshold", "Null_Handling_Strategy", "Export_Date"];

pub const DETAIL_COLUMNS: [&str; 7] = [
    "Process",
    "G2 Goal Source",
    "Final G2 Goal",
    "G1 Goal",
    "G3 Goal",
    "Null Values",
    "Applied Rules Count",
];

/// Write every row with its goals, followed by the calculation settings.
///
/// The header is the union of all row fields in first-seen order.
pub fn write_results<W: Write>(
    writer: W,
    rows: &[Row],
    config: &GoalConfig,
    export_date: NaiveDate,
) -> Result<()> {
    let columns: IndexSet<&str> = rows.iter().flat_map(|r| r.columns()).collect();

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns.iter().copied().chain(RESULT_META_COLUMNS))?;

    let bps = config.bps_threshold.to_string();
    let strategy = config.null_handling.as_str();
    let date = export_date.format("%Y-%m-%d").to_string();

    for row in rows {
        let mut record: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(FieldValue::to_string).unwrap_or_default())
            .collect();
        record.extend([bps.clone(), strategy.to_string(), date.clone()]);
        out.write_record(&record)?;
    }

    out.flush()?;
    debug!(rows = rows.len(), columns = columns.len(), "wrote results sheet");
    Ok(())
}

/// Write one line per audited process.
pub fn write_details<W: Write>(writer: W, trail: &AuditTrail) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(DETAIL_COLUMNS)?;

    for (process, audit) in trail.iter() {
        let tier = |field: &str| {
            audit
                .result_values
                .get(field)
                .filter(|v| !v.is_null())
                .map(FieldValue::to_string)
                .unwrap_or_else(|| "0".to_string())
        };
        let nulls = match audit.null_summary() {
            s if s.is_empty() => "None".to_string(),
            s => s,
        };

        out.write_record([
            process.to_string(),
            audit
                .g2_goal_source
                .clone()
                .unwrap_or_else(|| "No rules applied".to_string()),
            FieldValue::Number(audit.final_g2_goal.unwrap_or(0.0)).to_string(),
            tier(G1_GOAL),
            tier(G3_GOAL),
            nulls,
            audit.applied_rules.len().to_string(),
        ])?;
    }

    out.flush()?;
    debug!(processes = trail.len(), "wrote details sheet");
    Ok(())
}

/// Write the audit trail as pretty-printed JSON.
pub fn write_audit<W: Write>(mut writer: W, trail: &AuditTrail) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, trail)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
