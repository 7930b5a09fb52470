//! Tests for the rule store module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::{Action, Condition, RuleDefinition, RuleNode, StoredRule};

fn definition(goal: f64) -> RuleDefinition {
    RuleDefinition::base(RuleNode::new(
        Condition::value("X", ">", 5.0),
        Action::new("G2_goal", "value", goal),
    ))
}

fn store_with(names: &[&str]) -> RuleStore {
    let mut store = RuleStore::new();
    for (i, name) in names.iter().enumerate() {
        store.save(name, "", definition(i as f64 + 1.0)).unwrap();
    }
    store
}

const SINGLE_RULE_JSON: &str = r#"{
  "ruleName": "Imported",
  "ruleDescription": "from a single export",
  "version": "2.2",
  "id": 77,
  "rule": {
    "condition": {"leftColumn": "X", "operator": ">", "rightType": "value", "rightValue": "5"},
    "action": {"column": "G2_goal", "type": "value", "value": "42"}
  }
}"#;

// ── Lifecycle ───────────────────────────────────────────────────────

#[test]
fn save_assigns_unique_ids() {
    let store = store_with(&["A", "B", "C"]);
    let ids: Vec<u64> = store.rules().iter().map(|r| r.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids: {ids:?}");
    assert!(ids.iter().all(|id| *id > 0));
}

#[test]
fn save_with_existing_name_updates_in_place() {
    let mut store = store_with(&["Margin"]);
    let original = store.rules()[0].clone();

    let id = store.save("MARGIN", "updated", definition(9.0)).unwrap();

    assert_eq!(id, original.id);
    assert_eq!(store.len(), 1);
    let rule = store.get(id).unwrap();
    assert_eq!(rule.name, "MARGIN");
    assert_eq!(rule.description, "updated");
    assert_eq!(rule.created, original.created);
    assert!(rule.last_modified >= original.last_modified);
    assert_eq!(rule.rule, definition(9.0));
}

#[test]
fn save_rejects_invalid_rules() {
    let mut store = RuleStore::new();
    let err = store.save("Broken", "", RuleDefinition::default()).unwrap_err();
    assert!(matches!(err, RuleError::Validation(ref m) if m.contains("Broken")));

    let err = store.save("", "", definition(1.0)).unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
    assert!(store.is_empty());
}

#[test]
fn duplicate_picks_next_free_copy_name() {
    let mut store = store_with(&["Base"]);
    let base_id = store.rules()[0].id;

    store.duplicate(base_id).unwrap();
    store.duplicate(base_id).unwrap();
    let third = store.duplicate(base_id).unwrap();

    let names: Vec<&str> = store.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Base", "Base (Copy)", "Base (Copy 2)", "Base (Copy 3)"]);
    assert_eq!(store.get(third).unwrap().rule, definition(1.0));
}

#[test]
fn duplicate_skips_copy_names_differing_only_in_case() {
    let mut store = RuleStore::new();
    let base_id = store.save("Foo", "", definition(1.0)).unwrap();
    let other_id = store.save("foo (copy)", "unrelated", definition(999.0)).unwrap();

    let copy = store.duplicate(base_id).unwrap();

    assert_ne!(copy, other_id);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(copy).unwrap().name, "Foo (Copy 2)");
    let other = store.get(other_id).unwrap();
    assert_eq!(other.name, "foo (copy)");
    assert_eq!(other.description, "unrelated");
    assert_eq!(other.rule, definition(999.0));
}

#[test]
fn delete_removes_by_id() {
    let mut store = store_with(&["A", "B"]);
    let id = store.rules()[0].id;

    let removed = store.delete(id).unwrap();
    assert_eq!(removed.name, "A");
    assert_eq!(store.len(), 1);
    assert!(matches!(store.delete(id), Err(RuleError::NotFound(_))));
}

#[test]
fn select_by_id_or_name() {
    let store = store_with(&["First", "Second"]);
    let first = store.rules()[0].id;
    let second = store.rules()[1].id;

    assert_eq!(store.select::<&str>(&[]).unwrap(), vec![first, second]);
    let first_key = first.to_string();
    assert_eq!(
        store.select(&["second", first_key.as_str()]).unwrap(),
        vec![second, first]
    );
    assert!(matches!(store.select(&["Third"]), Err(RuleError::NotFound(k)) if k == "Third"));
}

#[test]
fn from_rules_fills_missing_and_clashing_ids() {
    let store = RuleStore::from_rules(vec![
        StoredRule::new(5, "A", definition(1.0)),
        StoredRule::new(0, "B", definition(1.0)),
        StoredRule::new(5, "C", definition(1.0)),
    ]);
    let ids: Vec<u64> = store.rules().iter().map(|r| r.id).collect();
    assert_eq!(ids[0], 5);
    assert!(ids[1] > 5 && ids[2] > ids[1]);
}

// ── Import / export ─────────────────────────────────────────────────

#[test]
fn import_single_rule_shape() {
    let mut store = RuleStore::new();
    let summary = store
        .import(SINGLE_RULE_JSON, FileFormat::Json, ImportMode::Merge)
        .unwrap();

    // An empty store always takes the imported rules as they are.
    assert_eq!(summary.mode, ImportMode::Replace);
    assert_eq!(summary.imported, 1);
    let rule = &store.rules()[0];
    assert_eq!(rule.id, 77);
    assert_eq!(rule.description, "from a single export");
    assert!(rule.rule.base_rule.is_some());
    assert!(rule.rule.calculated_rule.is_none());
}

#[test]
fn merge_skips_existing_names_and_assigns_fresh_ids() {
    let mut store = store_with(&["Existing"]);
    let doc = r#"[
      {"id": 1, "name": "existing", "rule": {"baseRule": {
        "condition": {"leftColumn": "X", "operator": ">", "rightType": "value", "rightValue": 1},
        "action": {"column": "G2_goal", "type": "value", "value": 1}}}},
      {"id": 2, "name": "Fresh", "rule": {"baseRule": {
        "condition": {"leftColumn": "X", "operator": ">", "rightType": "value", "rightValue": 1},
        "action": {"column": "G2_goal", "type": "value", "value": 2}}}}
    ]"#;

    let summary = store.import(doc, FileFormat::Json, ImportMode::Merge).unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, vec!["existing".to_string()]);
    assert_eq!(store.len(), 2);
    let fresh = store.find_by_name("fresh").unwrap();
    assert_ne!(fresh.id, 2);
}

#[test]
fn replace_discards_existing_rules() {
    let mut store = store_with(&["Old"]);
    let export = store_with(&["New A", "New B"]).export().unwrap();
    let text = serde_json::to_string(&export).unwrap();

    let summary = store.import(&text, FileFormat::Json, ImportMode::Replace).unwrap();

    assert_eq!(summary.imported, 2);
    let names: Vec<&str> = store.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["New A", "New B"]);
    assert_eq!(store.rules()[0].id, export.rules[0].id);
}

#[test]
fn import_rejects_bad_documents() {
    let mut store = store_with(&["Keep"]);

    let err = store.import(r#"{"foo": 1}"#, FileFormat::Json, ImportMode::Merge).unwrap_err();
    assert!(matches!(err, RuleError::Format(_)));

    let err = store.import("[]", FileFormat::Json, ImportMode::Merge).unwrap_err();
    assert!(matches!(err, RuleError::Format(_)));

    let err = store
        .import(r#"[{"name": "NoBody"}]"#, FileFormat::Json, ImportMode::Merge)
        .unwrap_err();
    assert!(matches!(err, RuleError::Validation(ref m) if m.contains("index 0")));

    let invalid = r#"[{"name": "Half", "rule": {"baseRule": {"condition": {"leftColumn": "X"}}}}]"#;
    let err = store.import(invalid, FileFormat::Json, ImportMode::Replace).unwrap_err();
    assert!(matches!(err, RuleError::Validation(ref m) if m.contains("'Half'")));

    // Nothing changed.
    assert_eq!(store.len(), 1);
    assert!(store.find_by_name("Keep").is_some());
}

#[test]
fn import_accepts_calculated_only_rules() {
    let doc = r#"[{"id": 5, "name": "Top-up", "rule": {
        "baseRule": null,
        "calculatedRule": {
            "condition": {"leftColumn": "G2_calculated", "operator": ">",
                          "rightType": "value", "rightValue": "10"},
            "action": {"column": "G2_calculated", "type": "add", "value": "5"}
        }
    }}]"#;
    let mut store = RuleStore::new();
    let summary = store.import(doc, FileFormat::Json, ImportMode::Merge).unwrap();

    assert_eq!(summary.imported, 1);
    let rule = store.find_by_name("top-up").unwrap();
    assert!(rule.rule.base_rule.is_none());
    assert!(rule.rule.calculated_rule.is_some());
}

#[test]
fn import_yaml_export_document() {
    let yaml = r#"
version: "2.2"
rules:
  - name: From YAML
    rule:
      baseRule:
        condition: {leftColumn: X, operator: ">=", rightType: column, rightColumn: Y}
        action: {column: G2_goal, type: reset}
"#;
    let mut store = RuleStore::new();
    store.import(yaml, FileFormat::Yaml, ImportMode::Merge).unwrap();
    assert_eq!(store.rules()[0].name, "From YAML");
    assert!(store.rules()[0].id > 0);
}

#[test]
fn export_documents() {
    let store = store_with(&["Q1: North/South?"]);
    let export = store.export().unwrap();
    assert_eq!(export.version, "2.2");
    assert_eq!(export.app_info.name, "Goal Setting Framework");

    let id = store.rules()[0].id;
    let (file_name, single) = store.export_single(id).unwrap();
    assert_eq!(file_name, "Q1_North_South_.json");
    assert_eq!(single.rule_name, "Q1: North/South?");
    assert_eq!(single.id, Some(id));

    let json = serde_json::to_string(&single).unwrap();
    assert!(json.starts_with(r#"{"ruleName":"Q1: North/South?","ruleDescription":"""#));

    assert!(matches!(RuleStore::new().export(), Err(RuleError::Validation(_))));
}

#[test]
fn sanitize_filename_rules() {
    assert_eq!(sanitize_filename("a b\t c"), "a_b_c");
    assert_eq!(sanitize_filename(r#"x\/:*?"<>|y"#), "x_y");
    assert_eq!(sanitize_filename("keep__one"), "keep_one");
    assert_eq!(sanitize_filename("plain-name.v2"), "plain-name.v2");
}

#[test]
fn import_mode_parses() {
    assert_eq!("Replace".parse::<ImportMode>().unwrap(), ImportMode::Replace);
    assert!("append".parse::<ImportMode>().is_err());
}

// ── Persistence ─────────────────────────────────────────────────────

#[test]
fn save_and_reload_json() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("nested").join("rules.json");
    let store = store_with(&["A", "B"]);

    store.save_file(&path).unwrap();
    let reloaded = RuleStore::open(&path).unwrap();

    assert_eq!(reloaded.rules(), store.rules());
    assert!(!dir.path().join("nested").join(".rules.json.tmp").exists());
}

#[test]
fn save_and_reload_yaml() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("rules.yaml");
    let store = store_with(&["Yaml rule"]);

    store.save_file(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("name: Yaml rule"));

    let reloaded = RuleStore::load_file(&path).unwrap();
    assert_eq!(reloaded.rules(), store.rules());
}

#[test]
fn new_ids_follow_loaded_ids() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("rules.json");
    let far_future = u64::MAX / 2;
    RuleStore::from_rules(vec![StoredRule::new(far_future, "Old", definition(1.0))])
        .save_file(&path)
        .unwrap();

    let mut store = RuleStore::open(&path).unwrap();
    let id = store.save("New", "", definition(2.0)).unwrap();
    assert_eq!(id, far_future + 1);
}

#[test]
fn open_missing_file_starts_empty() {
    let dir = TempDir::new().expect("create tempdir");
    let store = RuleStore::open(&dir.path().join("absent.json")).unwrap();
    assert!(store.is_empty());
}

#[test]
fn load_keeps_invalid_rules() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"[{"id": 3, "name": "Draft", "rule": {}}]"#).unwrap();

    let store = RuleStore::load_file(&path).unwrap();
    assert_eq!(store.get(3).map(|r| r.name.as_str()), Some("Draft"));
}
