//! Header-indexed CSV tables: the corpus of query records and every
//! result artifact the harness writes.

use crate::model::{DbFingerprint, QueryRecord};
use anyhow::{Context, Result};
use std::path::Path;

/// A CSV file held fully in memory. The experiment loops mutate cells in
/// place and rewrite the whole file after every row, so a crash loses at
/// most the in-flight row.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open corpus {}", path.display()))?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, adding the column (with empty cells) if missing.
    /// Existing columns are reused, so re-running an experiment over a
    /// corpus that already carries result columns overwrites them instead
    /// of appending duplicates.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column(name)?;
        self.rows.get(row).and_then(|r| r.get(idx)).map(String::as_str)
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value.into();
        }
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Builds a QueryRecord from the canonical corpus columns. Absent
    /// columns yield empty/none fields rather than errors: corpora differ
    /// in which fingerprint columns they carry.
    pub fn query_record(&self, row: usize) -> QueryRecord {
        let opt = |name: &str| {
            self.get(row, name)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        QueryRecord {
            id: self.get(row, "Id").unwrap_or_default().to_string(),
            task_no: self.get(row, "TaskNo").unwrap_or_default().to_string(),
            response_id: self.get(row, "ResponseId").unwrap_or_default().to_string(),
            difficulty: opt("Difficulty"),
            query: self.get(row, "Query").unwrap_or_default().to_string(),
            fingerprint: DbFingerprint {
                table_info: opt("table_info"),
                constraint_info: opt("constraint_info"),
                index_info: opt("index_info"),
                table_size: opt("table_size"),
                execution_plan: opt("explain_run_5"),
            },
        }
    }
}
