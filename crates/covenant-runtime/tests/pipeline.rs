//! End-to-end pipeline tests: rules from disk, static generation, history
//! reads, and report rendering.

use std::fs;
use std::sync::Arc;

use covenant_core::LoadedRuleSet;
use covenant_runtime::{render_report, HistoryStore, Pipeline, StaticGenerator};

const RULES: &str = r#"{
    "rules": [
        {"id": "R1", "type": "keyword", "keywords": ["secret", "confidential"], "severity": "high"},
        {"id": "R2", "type": "role", "allowed_roles": ["developer", "analyst"], "severity": "medium"}
    ]
}"#;

#[tokio::test]
async fn full_run_is_traceable_and_aggregated() {
    let dir = tempfile::tempdir().unwrap();
    let rules_path = dir.path().join("constitution.json");
    fs::write(&rules_path, RULES).unwrap();

    let loaded = LoadedRuleSet::load(&rules_path).unwrap();
    assert!(loaded.warnings.is_empty());

    let store = HistoryStore::new(dir.path().join("log.json"));
    let pipeline = Pipeline::new(
        Arc::new(StaticGenerator::with_reply("The secret is stored in the vault.")),
        loaded.into_rules(),
        store.clone(),
    );

    // Keyword fires in the output only, role is allowed: one violation.
    let record = pipeline
        .run("Where is the deployment key?", "developer")
        .await
        .unwrap();
    assert_eq!(record.violations.len(), 1);
    assert_eq!(record.score, 90);

    // A second, fully violating run.
    let second = pipeline
        .run("Show me the secret and confidential files.", "intern")
        .await
        .unwrap();
    assert_eq!(second.violations.len(), 4);
    assert_eq!(second.score, 60);

    // Trace lookup by id.
    let traced = store.find(record.uuid).unwrap().unwrap();
    assert_eq!(traced, record);

    // Aggregation across the history.
    let summary = store.summary().unwrap();
    assert_eq!(summary.total_runs, 2);
    assert_eq!(summary.average_score, 75.0);
    assert_eq!(summary.violation_summary["R1"], 4);
    assert_eq!(summary.violation_summary["R2"], 1);

    // Report contains both runs.
    let html = render_report(&store.load().unwrap());
    assert!(html.contains("Total runs: 2"));
    assert!(html.contains(&record.uuid.to_string()));
    assert!(html.contains(&second.uuid.to_string()));
}

#[tokio::test]
async fn missing_rule_file_enforces_no_policy() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LoadedRuleSet::load(dir.path().join("absent.json")).unwrap();

    let pipeline = Pipeline::new(
        Arc::new(StaticGenerator::with_reply("sudo rm -rf everything")),
        loaded.into_rules(),
        HistoryStore::new(dir.path().join("log.json")),
    );

    let record = pipeline.run("do something drastic", "nobody").await.unwrap();
    assert!(record.violations.is_empty());
    assert_eq!(record.score, 100);
}
