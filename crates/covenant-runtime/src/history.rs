//! JSON-backed history of pipeline runs.
//!
//! Every pipeline run is appended to an ordered JSON array on disk. The
//! file format matches the historical log layout (`uuid`, `timestamp`,
//! `input`, `output`, `role`, `llm_model`, `violations`, `score`), so
//! existing logs keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use covenant_core::Violation;

/// Mean score reported when no runs have been logged yet.
const EMPTY_AVERAGE_SCORE: f64 = 100.0;

/// Errors from the history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to access history file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One logged pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Generated identifier for this run.
    pub uuid: Uuid,

    /// When the run started.
    pub timestamp: DateTime<Utc>,

    /// The original user input.
    pub input: String,

    /// The generated output that was checked.
    pub output: String,

    /// Actor role supplied by the caller.
    pub role: String,

    /// Model that served the generation.
    pub llm_model: String,

    /// Violations found by the evaluator, in evaluation order.
    pub violations: Vec<Violation>,

    /// Compliance score in `[0, 100]`.
    pub score: u8,
}

/// Aggregate compliance over all logged runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Number of logged runs.
    pub total_runs: usize,

    /// Mean score across all runs, rounded to two decimals. Defaults to
    /// 100 when the history is empty.
    pub average_score: f64,

    /// Violation occurrence count per rule id, across all runs.
    pub violation_summary: BTreeMap<String, u64>,
}

/// File-backed store of [`RunRecord`]s.
///
/// Reads are forgiving: a missing file is an empty history, and a corrupted
/// file is logged and treated as empty rather than blocking the pipeline.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records, oldest first.
    pub fn load(&self) -> Result<Vec<RunRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %error,
                    "history file is corrupted, treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Append one record and persist the full history.
    ///
    /// The history is rewritten through a sibling temp file and renamed
    /// into place, so a crash mid-write leaves the previous history intact.
    /// Concurrent writers are not coordinated: two stores appending to the
    /// same file at once can lose a record to the read-modify-write race.
    /// A single writer per log file is assumed.
    pub fn append(&self, record: &RunRecord) -> Result<(), HistoryError> {
        let mut records = self.load()?;
        records.push(record.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(&records)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Look up a single run by id.
    pub fn find(&self, id: Uuid) -> Result<Option<RunRecord>, HistoryError> {
        Ok(self.load()?.into_iter().find(|record| record.uuid == id))
    }

    /// Aggregate all logged runs.
    pub fn summary(&self) -> Result<HistorySummary, HistoryError> {
        let records = self.load()?;
        if records.is_empty() {
            return Ok(HistorySummary {
                total_runs: 0,
                average_score: EMPTY_AVERAGE_SCORE,
                violation_summary: BTreeMap::new(),
            });
        }

        let total: u64 = records.iter().map(|record| u64::from(record.score)).sum();
        let average = total as f64 / records.len() as f64;

        let mut violation_summary = BTreeMap::new();
        for record in &records {
            for violation in &record.violations {
                *violation_summary
                    .entry(violation.rule_id.clone())
                    .or_insert(0u64) += 1;
            }
        }

        Ok(HistorySummary {
            total_runs: records.len(),
            average_score: (average * 100.0).round() / 100.0,
            violation_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{Severity, ViolationKind};

    fn record(score: u8, violations: Vec<Violation>) -> RunRecord {
        RunRecord {
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
            input: "input".to_string(),
            output: "output".to_string(),
            role: "developer".to_string(),
            llm_model: "test-model".to_string(),
            violations,
            score,
        }
    }

    fn violation(rule_id: &str) -> Violation {
        Violation {
            rule_id: rule_id.to_string(),
            kind: ViolationKind::Keyword,
            trigger: "secret".to_string(),
            severity: Severity::High,
        }
    }

    fn temp_store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("log.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_find_roundtrip() {
        let (_dir, store) = temp_store();

        let first = record(100, vec![]);
        let second = record(90, vec![violation("R1")]);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], first);
        assert_eq!(records[1], second);

        assert_eq!(store.find(second.uuid).unwrap(), Some(second));
        assert_eq!(store.find(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_append_replaces_file_and_removes_staging() {
        let (_dir, store) = temp_store();
        store.append(&record(100, vec![])).unwrap();
        store.append(&record(90, vec![])).unwrap();

        assert_eq!(store.load().unwrap().len(), 2);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupted_file_degrades_to_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_empty_summary_defaults_to_100() {
        let (_dir, store) = temp_store();
        let summary = store.summary().unwrap();

        assert_eq!(summary.total_runs, 0);
        assert_eq!(summary.average_score, 100.0);
        assert!(summary.violation_summary.is_empty());
    }

    #[test]
    fn test_summary_counts_violations_per_rule() {
        let (_dir, store) = temp_store();
        store.append(&record(100, vec![])).unwrap();
        store
            .append(&record(80, vec![violation("R1"), violation("R1")]))
            .unwrap();
        store.append(&record(90, vec![violation("R2")])).unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.total_runs, 3);
        assert_eq!(summary.average_score, 90.0);
        assert_eq!(summary.violation_summary["R1"], 2);
        assert_eq!(summary.violation_summary["R2"], 1);
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        let (_dir, store) = temp_store();
        store.append(&record(100, vec![])).unwrap();
        store.append(&record(90, vec![])).unwrap();
        store.append(&record(90, vec![])).unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.average_score, 93.33);
    }

    #[test]
    fn test_wire_format_field_names() {
        let entry = record(90, vec![violation("R1")]);
        let json = serde_json::to_value(&entry).unwrap();

        for field in [
            "uuid",
            "timestamp",
            "input",
            "output",
            "role",
            "llm_model",
            "violations",
            "score",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["violations"][0]["type"], "keyword");
    }
}
