//! Append-only JSONL log of rewrite outcomes: one JSON object per line,
//! flushed per entry, re-read on startup so interrupted batches resume
//! where they left off.

use super::RewriteOutcome;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub struct RewriteLog {
    file: File,
}

#[derive(Serialize)]
struct Entry<'a> {
    at: String,
    #[serde(flatten)]
    outcome: &'a RewriteOutcome,
}

impl RewriteLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open rewrite log {}", path.display()))?;
        Ok(Self { file })
    }

    /// Names of queries already present in the log. A malformed line is
    /// a hard error: the log is structured data, not free text.
    pub fn history(path: &Path) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        if !path.exists() {
            return Ok(names);
        }
        let reader = BufReader::new(
            File::open(path)
                .with_context(|| format!("failed to read rewrite log {}", path.display()))?,
        );
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line)
                .with_context(|| format!("malformed rewrite log line: {line}"))?;
            if let Some(name) = value.get("name").and_then(|v| v.as_str()) {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    pub fn append(&mut self, outcome: &RewriteOutcome) -> Result<()> {
        let entry = Entry {
            at: Utc::now().to_rfc3339(),
            outcome,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str) -> RewriteOutcome {
        RewriteOutcome {
            name: name.into(),
            input_sql: "SELECT 1".into(),
            input_cost: 10.0,
            output_sql: Some("SELECT 1".into()),
            output_cost: 8.0,
            used_rules: vec!["PULL_UP_SUBQUERY".into()],
            rewrite_time_ms: 42,
        }
    }

    #[test]
    fn appended_entries_are_recovered_by_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("res.jsonl");
        let mut log = RewriteLog::open(&path).unwrap();
        log.append(&outcome("q1")).unwrap();
        log.append(&outcome("q2")).unwrap();

        let history = RewriteLog::history(&path).unwrap();
        assert!(history.contains("q1"));
        assert!(history.contains("q2"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn missing_log_means_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = RewriteLog::history(&dir.path().join("absent.jsonl")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn malformed_lines_fail_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.jsonl");
        std::fs::write(&path, "{'name': 'python-literal'}\n").unwrap();
        let err = RewriteLog::history(&path).unwrap_err();
        assert!(err.to_string().contains("malformed rewrite log line"));
    }

    #[test]
    fn entries_carry_timestamp_and_flattened_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.jsonl");
        let mut log = RewriteLog::open(&path).unwrap();
        log.append(&outcome("q1")).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(body.trim()).unwrap();
        assert!(value.get("at").is_some());
        assert_eq!(value["name"], "q1");
        assert_eq!(value["used_rules"][0], "PULL_UP_SUBQUERY");
    }
}
