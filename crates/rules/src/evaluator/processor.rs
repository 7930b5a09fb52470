//! Goal processor: runs selected rule definitions over rows.

use goalset_core::config::GoalConfig;
use goalset_core::fields::{ALL_CONDITIONS_FAILED, G2_GOAL};
use goalset_core::{NullHandling, Row};
use tracing::{debug, info, warn};

use crate::audit_log::{AuditTrail, ProcessAudit};
use crate::schema::StoredRule;

use super::access::RowContext;
use super::rule::{CalculationStep, RuleEvaluator};

/// Working G2 state of a single row pass.
#[derive(Debug, Default)]
struct RowPass {
    g2_goal: Option<f64>,
    source: Option<String>,
    path: Vec<CalculationStep>,
    base_applied: bool,
}

/// Computes G1/G2/G3 goals for rows from stored rule definitions.
#[derive(Debug, Clone, Default)]
pub struct GoalProcessor {
    config: GoalConfig,
    process_column: Option<String>,
}

impl GoalProcessor {
    pub fn new(config: GoalConfig) -> Self {
        Self {
            config,
            process_column: None,
        }
    }

    /// Column identifying the process of each row. Without one, the first
    /// column of each row is used.
    pub fn with_process_column(mut self, column: impl Into<String>) -> Self {
        self.process_column = Some(column.into());
        self
    }

    pub fn config(&self) -> &GoalConfig {
        &self.config
    }

    /// Run the rules in `selected_ids` order over every row.
    ///
    /// Rows are mutated in place to carry `G1_goal`, `G2_goal` and `G3_goal`.
    /// Ids with no matching rule are skipped.
    pub fn process(
        &self,
        rows: &mut [Row],
        rules: &[StoredRule],
        selected_ids: &[u64],
    ) -> AuditTrail {
        let selected: Vec<&StoredRule> = selected_ids
            .iter()
            .filter_map(|id| {
                let found = rules.iter().find(|r| r.id == *id);
                if found.is_none() {
                    warn!(rule_id = id, "selected rule not found, skipping");
                }
                found
            })
            .collect();

        let mut trail = AuditTrail::new();
        for (index, row) in rows.iter_mut().enumerate() {
            let process_id = self.process_id(row, index);
            let audit = self.process_row(row, &selected);
            if trail.insert(process_id.clone(), audit).is_some() {
                warn!(process = %process_id, "duplicate process id, keeping the later row");
            }
        }

        info!(
            rows = rows.len(),
            rules = selected.len(),
            null_handling = %self.config.null_handling,
            bps_threshold = self.config.bps_threshold,
            "goals calculated"
        );
        trail
    }

    /// Run `rules` over a single row and return its audit entry.
    ///
    /// Base rules run first; a base goal becomes `G2_calculated` for the
    /// calculated rules of this and later definitions in the same row.
    /// A calculated rule that reads `G2_calculated` only runs once a base
    /// goal exists.
    pub fn process_row(&self, row: &mut Row, rules: &[&StoredRule]) -> ProcessAudit {
        let null_handling = self.config.null_handling;
        let evaluator = RuleEvaluator::new(null_handling);
        let mut audit = ProcessAudit::new(row.clone(), null_handling);
        let mut pass = RowPass::default();

        {
            let mut ctx = RowContext::new(row);
            for stored in rules {
                if let Some(base) = &stored.rule.base_rule {
                    let label = format!("{} (Base)", stored.name);
                    let outcome = evaluator.process_rule(base, &mut ctx, &label, stored.id);
                    if let Some(goal) = outcome.g2_goal {
                        pass.g2_goal = Some(goal);
                        pass.source = outcome.source.clone();
                        pass.path = outcome.calculation_path.clone();
                        pass.base_applied = true;
                        ctx.set_calculated_goal(goal);
                    }
                    audit.record(outcome);
                }

                if let Some(calculated) = &stored.rule.calculated_rule {
                    let runnable = (pass.base_applied && pass.g2_goal.is_some())
                        || (!pass.base_applied && !calculated.uses_calculated_goal());
                    if !runnable {
                        debug!(rule = %stored.name, "calculated rule needs a base goal, skipped");
                        continue;
                    }
                    if pass.base_applied {
                        if let Some(goal) = pass.g2_goal {
                            ctx.set_calculated_goal(goal);
                        }
                    }

                    let label = format!("{} (Calculated)", stored.name);
                    let outcome = evaluator.process_rule(calculated, &mut ctx, &label, stored.id);
                    if let Some(goal) = outcome.g2_goal {
                        pass.g2_goal = Some(goal);
                        let calculated_source = outcome.source.clone().unwrap_or_default();
                        if pass.base_applied {
                            let base_source = pass.source.take().unwrap_or_default();
                            pass.source = Some(format!("{base_source} → {calculated_source}"));
                            pass.path.extend(outcome.calculation_path.iter().cloned());
                        } else {
                            pass.source = Some(calculated_source);
                            pass.path = outcome.calculation_path.clone();
                        }
                    }
                    audit.record(outcome);
                }
            }
        }

        match pass.g2_goal {
            Some(goal) => {
                row.set(G2_GOAL, goal);
                audit.final_g2_goal = Some(goal);
                audit.g2_goal_source = pass.source;
                audit.g2_goal_calculation_path = pass.path;
            }
            None if !audit.null_values_encountered.is_empty() => {
                let sentinel = match null_handling {
                    NullHandling::Flag => audit
                        .null_values_encountered
                        .iter()
                        .map(|field| format!("{field} is null"))
                        .collect::<Vec<_>>()
                        .join(", "),
                    NullHandling::Ignore => ALL_CONDITIONS_FAILED.to_string(),
                };
                row.set(G2_GOAL, sentinel);
            }
            None => {
                row.set(G2_GOAL, ALL_CONDITIONS_FAILED);
                audit.g2_goal_source = Some(ALL_CONDITIONS_FAILED.to_string());
            }
        }

        super::tiers::derive_tiers(row, self.config.bps_threshold);
        audit.result_values = row.clone();
        audit
    }

    /// Value of the process column, or `Row <n>` when it is blank.
    pub fn process_id(&self, row: &Row, index: usize) -> String {
        let column = self
            .process_column
            .as_deref()
            .or_else(|| row.columns().next());
        column
            .and_then(|c| row.get(c))
            .map(|v| v.to_string())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("Row {}", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use goalset_core::fields::{G1_GOAL, G3_GOAL};
    use goalset_core::FieldValue;

    use super::*;
    use crate::schema::{Action, Condition, RuleDefinition, RuleNode};

    fn processor() -> GoalProcessor {
        GoalProcessor::new(GoalConfig::default()).with_process_column("Proc")
    }

    fn stored(id: u64, name: &str, rule: RuleDefinition) -> StoredRule {
        StoredRule::new(id, name, rule)
    }

    fn rows() -> Vec<Row> {
        vec![Row::from_iter([
            ("Proc", FieldValue::Text("A".into())),
            ("X", FieldValue::Number(10.0)),
        ])]
    }

    fn num(row: &Row, field: &str) -> FieldValue {
        row.get(field).cloned().unwrap_or(FieldValue::Null)
    }

    #[test]
    fn single_base_rule_scenario() {
        let rule = stored(
            1,
            "Uplift",
            RuleDefinition::base(RuleNode::new(
                Condition::value("X", ">", "5"),
                Action::new("Y", "value", "42"),
            )),
        );
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[rule], &[1]);

        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(42.0));
        assert_eq!(num(&rows[0], G1_GOAL), FieldValue::Number(42.5));
        assert_eq!(num(&rows[0], G3_GOAL), FieldValue::Number(41.5));
        assert!(!rows[0].contains("Y"));
        assert!(!rows[0].contains("G2_calculated"));

        let audit = trail.get("A").unwrap();
        assert_eq!(audit.final_g2_goal, Some(42.0));
        assert_eq!(audit.processed_rule_ids, vec![1]);
        assert_eq!(
            audit.g2_goal_source.as_deref(),
            Some("Main condition satisfied -> Set Y = 42")
        );
        assert_eq!(audit.applied_rules[0].rule_name, "Uplift (Base)");
        assert!(!audit.original_values.contains(G2_GOAL));
        assert!(audit.result_values.contains(G2_GOAL));
    }

    #[test]
    fn null_flag_sentinel() {
        let rule = stored(
            1,
            "r",
            RuleDefinition::base(RuleNode::new(
                Condition::value("Missing", ">", "5"),
                Action::new("Y", "value", "42"),
            )),
        );
        let mut rows = rows();
        processor().process(&mut rows, &[rule], &[1]);
        let sentinel = FieldValue::Text("Missing is null".into());
        assert_eq!(num(&rows[0], G2_GOAL), sentinel);
        assert_eq!(num(&rows[0], G1_GOAL), sentinel);
        assert_eq!(num(&rows[0], G3_GOAL), sentinel);
    }

    #[test]
    fn multiple_nulls_are_comma_joined() {
        let mut compound: crate::schema::CompoundCondition = Condition::value("P", ">", "5").into();
        compound.or_conditions = vec![Condition::column("X", ">", "Q")];
        let rule = stored(
            1,
            "r",
            RuleDefinition::base(RuleNode::new(compound, Action::new("Y", "value", "1"))),
        );
        let mut rows = rows();
        processor().process(&mut rows, &[rule], &[1]);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Text("P is null, Q is null".into()));
    }

    #[test]
    fn ignore_policy_reports_plain_failure() {
        let rule = stored(
            1,
            "r",
            RuleDefinition::base(RuleNode::new(
                Condition::value("Missing", ">", "5"),
                Action::new("Y", "value", "42"),
            )),
        );
        let config = GoalConfig {
            null_handling: NullHandling::Ignore,
            ..GoalConfig::default()
        };
        let mut rows = rows();
        let trail = GoalProcessor::new(config)
            .with_process_column("Proc")
            .process(&mut rows, &[rule], &[1]);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Text(ALL_CONDITIONS_FAILED.into()));
        let audit = trail.get("A").unwrap();
        assert!(audit.g2_goal_source.is_none());
        assert!(audit.null_values_encountered.contains("Missing"));
    }

    #[test]
    fn no_match_sentinel() {
        let rule = stored(
            1,
            "r",
            RuleDefinition::base(RuleNode::new(
                Condition::value("X", "<", "5"),
                Action::new("Y", "value", "42"),
            )),
        );
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[rule], &[1]);
        let failed = FieldValue::Text(ALL_CONDITIONS_FAILED.into());
        assert_eq!(num(&rows[0], G2_GOAL), failed);
        assert_eq!(num(&rows[0], G1_GOAL), failed);
        assert_eq!(
            trail.get("A").unwrap().g2_goal_source.as_deref(),
            Some(ALL_CONDITIONS_FAILED)
        );
    }

    fn calc_node() -> RuleNode {
        RuleNode::new(
            Condition::value("G2_calculated", ">", "40"),
            Action::new("G2_calculated", "add", "8"),
        )
    }

    #[test]
    fn calculated_rule_builds_on_base_goal() {
        let def = RuleDefinition::base(RuleNode::new(
            Condition::value("X", ">", "5"),
            Action::new("Y", "value", "42"),
        ))
        .with_calculated(calc_node());
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[stored(1, "Two phase", def)], &[1]);

        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(50.0));
        let audit = trail.get("A").unwrap();
        assert_eq!(
            audit.g2_goal_source.as_deref(),
            Some("Main condition satisfied -> Set Y = 42 → Main condition satisfied -> G2_calculated + 8")
        );
        assert_eq!(audit.g2_goal_calculation_path.len(), 2);
        assert_eq!(audit.applied_rules[1].rule_name, "Two phase (Calculated)");
        assert!(!rows[0].contains("G2_calculated"));
    }

    #[test]
    fn calculated_rule_reading_base_goal_is_gated() {
        let def = RuleDefinition::base(RuleNode::new(
            Condition::value("X", "<", "5"),
            Action::new("Y", "value", "42"),
        ))
        .with_calculated(calc_node());
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[stored(1, "r", def)], &[1]);

        let audit = trail.get("A").unwrap();
        assert_eq!(audit.applied_rules.len(), 1);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Text(ALL_CONDITIONS_FAILED.into()));
    }

    #[test]
    fn standalone_calculated_rule_runs_without_base_goal() {
        let def = RuleDefinition::base(RuleNode::new(
            Condition::value("X", "<", "5"),
            Action::new("Y", "value", "42"),
        ))
        .with_calculated(RuleNode::new(
            Condition::value("X", "=", "10"),
            Action::new("X", "multiply", "3"),
        ));
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[stored(1, "r", def)], &[1]);

        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(30.0));
        assert_eq!(
            trail.get("A").unwrap().g2_goal_source.as_deref(),
            Some("Main condition satisfied -> X × 3")
        );
    }

    #[test]
    fn base_goal_is_visible_to_later_definitions() {
        let first = stored(
            1,
            "first",
            RuleDefinition::base(RuleNode::new(
                Condition::value("X", ">", "5"),
                Action::new("Y", "value", "42"),
            )),
        );
        let second = stored(2, "second", RuleDefinition::default().with_calculated(calc_node()));
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[first, second], &[1, 2]);

        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(50.0));
        assert_eq!(trail.get("A").unwrap().processed_rule_ids, vec![1, 2]);
    }

    #[test]
    fn calculated_goal_does_not_leak_across_rows() {
        let def = RuleDefinition::base(RuleNode::new(
            Condition::value("X", ">", "5"),
            Action::new("Y", "value", "42"),
        ))
        .with_calculated(calc_node());
        let mut rows = vec![
            Row::from_iter([
                ("Proc", FieldValue::Text("A".into())),
                ("X", FieldValue::Number(10.0)),
            ]),
            Row::from_iter([
                ("Proc", FieldValue::Text("B".into())),
                ("X", FieldValue::Number(1.0)),
            ]),
        ];
        processor().process(&mut rows, &[stored(1, "r", def)], &[1]);

        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(50.0));
        assert_eq!(num(&rows[1], G2_GOAL), FieldValue::Text(ALL_CONDITIONS_FAILED.into()));
    }

    #[test]
    fn later_definition_overrides_earlier_goal() {
        let first = stored(
            1,
            "first",
            RuleDefinition::base(RuleNode::new(
                Condition::value("X", ">", "5"),
                Action::new("Y", "value", "1"),
            )),
        );
        let second = stored(
            2,
            "second",
            RuleDefinition::base(RuleNode::new(
                Condition::value("X", ">", "5"),
                Action::new("Y", "value", "2"),
            )),
        );
        let mut rows = rows();
        processor().process(&mut rows, &[first.clone(), second.clone()], &[2, 1]);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(1.0));

        let mut rows = self::rows();
        processor().process(&mut rows, &[first, second], &[1, 2]);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Number(2.0));
    }

    #[test]
    fn unknown_selected_ids_are_skipped() {
        let mut rows = rows();
        let trail = processor().process(&mut rows, &[], &[99]);
        assert_eq!(trail.len(), 1);
        assert_eq!(num(&rows[0], G2_GOAL), FieldValue::Text(ALL_CONDITIONS_FAILED.into()));
    }

    #[test]
    fn process_id_falls_back_to_position() {
        let p = GoalProcessor::default();
        let row = Row::from_iter([("Name", FieldValue::Text("North".into()))]);
        assert_eq!(p.process_id(&row, 0), "North");
        let blank = Row::from_iter([("Name", FieldValue::Null)]);
        assert_eq!(p.process_id(&blank, 4), "Row 5");
        assert_eq!(processor().process_id(&row, 2), "Row 3");
    }

    #[test]
    fn repeated_pass_on_copies_is_identical() {
        let def = RuleDefinition::base(RuleNode::new(
            Condition::value("X", ">", "5"),
            Action::new("Y", "percent-increase", "12.5"),
        ));
        let rules = [stored(1, "r", def)];
        let mut a = rows();
        let mut b = rows();
        processor().process(&mut a, &rules, &[1]);
        processor().process(&mut b, &rules, &[1]);
        assert_eq!(a, b);
    }
}
