use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use goalset_core::NullHandling;
use goalset_rules::store::ImportMode;

/// Rule-driven G1/G2/G3 goal calculation.
///
/// Loads process data from CSV files, applies stored goal rules to every
/// row and writes the goals with an audit of how each was derived.
#[derive(Parser, Debug)]
#[command(name = "goalset", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Calculate goals for one or more CSV files
    Calculate(CalculateArgs),
    /// Manage the rule store
    Rules {
        /// Rule store file (.json or .yaml); defaults to GOALSET_RULES_PATH
        #[arg(long, global = true)]
        store: Option<PathBuf>,

        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// CSV files to merge; the first column of each names the process
    #[arg(long = "data", required = true, num_args = 1..)]
    pub data: Vec<PathBuf>,

    /// Rule file to read instead of the configured store
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Rules to apply, by id or name, in order (default: all)
    #[arg(long = "select")]
    pub select: Vec<String>,

    /// Only calculate these processes
    #[arg(long = "process")]
    pub processes: Vec<String>,

    /// Spread between goal tiers in basis points
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// How null fields are treated: flag or ignore
    #[arg(long, value_parser = parse_null_handling)]
    pub null_handling: Option<NullHandling>,

    /// Column identifying each process (default: first column)
    #[arg(long)]
    pub process_column: Option<String>,

    /// Write the results sheet here instead of printing a summary
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the rule-application details sheet
    #[arg(long)]
    pub details: Option<PathBuf>,

    /// Write the audit trail as JSON
    #[arg(long)]
    pub audit: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List stored rules
    List,
    /// Print one stored rule as JSON
    Show {
        /// Rule id or name
        rule: String,
    },
    /// Save a rule definition file under a name (updates a rule with that name)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// JSON or YAML file holding `{baseRule, calculatedRule}` or a flat rule
        file: PathBuf,
    },
    /// Validate stored rules
    Validate {
        /// Rule ids or names (default: all)
        rules: Vec<String>,
        /// Also check column references against this CSV header
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Import rules from an export document, a rule list or a single rule
    Import {
        file: PathBuf,
        #[arg(long, default_value = "merge", value_parser = parse_import_mode)]
        mode: ImportMode,
    },
    /// Export all rules, or one rule with --rule
    Export {
        /// Rule id or name to export on its own
        #[arg(long)]
        rule: Option<String>,
        /// Output file or directory (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Copy a rule under a "(Copy)" name
    Duplicate { rule: String },
    /// Delete a rule
    Delete { rule: String },
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("'{s}' is not a non-negative number of basis points")),
    }
}

fn parse_null_handling(s: &str) -> Result<NullHandling, String> {
    s.parse().map_err(|e: goalset_core::GoalsetError| e.to_string())
}

fn parse_import_mode(s: &str) -> Result<ImportMode, String> {
    s.parse().map_err(|e: goalset_rules::RuleError| e.to_string())
}
