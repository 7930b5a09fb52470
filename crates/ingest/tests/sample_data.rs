//! Runs the sample datasets in `data/sample/` through import, goal
//! calculation and export.

use std::path::PathBuf;

use chrono::NaiveDate;
use goalset_core::config::GoalConfig;
use goalset_core::FieldValue;
use goalset_ingest::{csv_export, CsvImporter, Dataset};
use goalset_rules::store::RuleStore;
use goalset_rules::GoalProcessor;
use tempfile::TempDir;

fn data_dir() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn sample() -> Dataset {
    let q1 = CsvImporter::import(&data_dir().join("sample/processes.csv")).unwrap();
    let q2 = CsvImporter::import(&data_dir().join("sample/processes-q2.csv")).unwrap();
    Dataset::merge([q1, q2])
}

#[test]
fn merged_sample_lists_processes() {
    let dataset = sample();
    assert_eq!(
        dataset.columns,
        vec!["Process", "Revenue", "Cost", "Headcount", "Region", "Backlog"]
    );
    assert_eq!(
        dataset.processes(),
        vec!["Proc A", "Proc B", "Proc C", "Proc D", "Proc E", "Proc F"]
    );
}

#[test]
fn sample_goals_end_to_end() {
    let dataset = sample().filter_processes(&["Proc A", "Proc D", "Proc E"]);
    let store =
        RuleStore::load_file(&data_dir().join("rules/examples/revenue-growth.json")).unwrap();
    let ids = store.select::<&str>(&[]).unwrap();

    let mut rows = dataset.rows;
    let config = GoalConfig::default();
    let trail = GoalProcessor::new(config)
        .with_process_column(dataset.process_column.as_str())
        .process(&mut rows, store.rules(), &ids);

    let g2: Vec<_> = rows.iter().map(|r| r.get("G2_goal").cloned()).collect();
    assert_eq!(
        g2,
        vec![
            Some(FieldValue::Number(55.0)),
            Some(FieldValue::Text("Revenue is null".into())),
            // 70 > 50 and 9 >= 5, then +5 from the calculated rule.
            Some(FieldValue::Number(55.0)),
        ]
    );

    let dir = TempDir::new().expect("create tempdir");
    let results = dir.path().join("results.csv");
    let details = dir.path().join("details.csv");
    let audit = dir.path().join("audit.json");
    let date = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();

    csv_export::write_results(std::fs::File::create(&results).unwrap(), &rows, &config, date)
        .unwrap();
    csv_export::write_details(std::fs::File::create(&details).unwrap(), &trail).unwrap();
    csv_export::write_audit(std::fs::File::create(&audit).unwrap(), &trail).unwrap();

    let results = std::fs::read_to_string(results).unwrap();
    assert_eq!(results.lines().count(), 4);
    let header = results.lines().next().unwrap();
    assert!(header.ends_with("BPS_Threshold,Null_Handling_Strategy,Export_Date"));

    let details = std::fs::read_to_string(details).unwrap();
    assert!(details.contains("Proc D,No rules applied,0,Revenue is null,Revenue is null,Revenue,"));

    let audit: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(audit).unwrap()).unwrap();
    assert_eq!(audit["Proc E"]["resultValues"]["G1_goal"], serde_json::json!(55.5));
}
