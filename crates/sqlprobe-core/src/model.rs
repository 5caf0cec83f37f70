use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats;

/// One query loaded from the corpus. Identity plus the literal query text
/// plus the database fingerprint context used by rewrite prompts.
/// Immutable once loaded; results are written to separate columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub task_no: String,
    pub response_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub query: String,
    #[serde(default)]
    pub fingerprint: DbFingerprint,
}

impl QueryRecord {
    /// Join key used to pair baseline and rewritten rows across files.
    pub fn join_key(&self) -> String {
        format!("{}_{}", self.task_no, self.response_id)
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// Schema/constraints/indexes/sizes context for the target database,
/// carried through from the corpus columns. Only the rewriter reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbFingerprint {
    #[serde(default)]
    pub table_info: Option<String>,
    #[serde(default)]
    pub constraint_info: Option<String>,
    #[serde(default)]
    pub index_info: Option<String>,
    #[serde(default)]
    pub table_size: Option<String>,
    #[serde(default)]
    pub execution_plan: Option<String>,
}

/// Outcome of measuring one metric. `Failed` renders as the literal
/// `error` marker at the CSV boundary, which keeps "measured and failed"
/// distinct from "never measured" (an empty cell).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure<T> {
    Value(T),
    Failed,
}

impl<T> Measure<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Measure::Value(v) => Some(v),
            Measure::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Measure::Failed)
    }

    pub fn from_option(v: Option<T>) -> Self {
        match v {
            Some(v) => Measure::Value(v),
            None => Measure::Failed,
        }
    }
}

impl<T: fmt::Display> Measure<T> {
    /// CSV cell representation.
    pub fn field(&self) -> String {
        match self {
            Measure::Value(v) => v.to_string(),
            Measure::Failed => "error".to_string(),
        }
    }
}

/// One measured run of one query. A hard per-run failure leaves every
/// field empty; individual fields may also be missing on their own when
/// the plan text lacks the corresponding marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionSample {
    pub time_ms: Option<f64>,
    pub cost: Option<f64>,
    pub rows: Option<i64>,
    pub plan: Option<String>,
}

impl ExecutionSample {
    pub fn failed() -> Self {
        Self::default()
    }

    /// A run counts as failed when no execution time could be extracted.
    pub fn is_failed(&self) -> bool {
        self.time_ms.is_none()
    }
}

/// The ordered sequence of measured runs for one query (warm-up already
/// discarded). Holds exactly the N samples of one experiment; failed runs
/// stay in place rather than being dropped.
#[derive(Debug, Clone, Default)]
pub struct RunSet {
    pub samples: Vec<ExecutionSample>,
}

impl RunSet {
    pub fn new(samples: Vec<ExecutionSample>) -> Self {
        Self { samples }
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.time_ms).collect()
    }

    pub fn costs(&self) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| !s.is_failed())
            .filter_map(|s| s.cost)
            .collect()
    }

    pub fn rows(&self) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| !s.is_failed())
            .filter_map(|s| s.rows.map(|r| r as f64))
            .collect()
    }

    pub fn aggregate(&self) -> AggregateStats {
        AggregateStats::from_run_set(self)
    }
}

/// Central-tendency / percentile summary of a RunSet, computed only over
/// non-error samples. An empty sample list marks the whole metric group
/// `Failed`, never zero.
#[derive(Debug, Clone)]
pub struct AggregateStats {
    pub avg_time: Measure<f64>,
    pub median_time: Measure<f64>,
    pub p75_time: Measure<f64>,
    pub p90_time: Measure<f64>,
    pub avg_cost: Measure<f64>,
    pub median_cost: Measure<f64>,
    pub avg_rows: Measure<f64>,
    pub median_rows: Measure<f64>,
    pub p75_rows: Measure<f64>,
    pub p90_rows: Measure<f64>,
}

impl AggregateStats {
    pub fn from_run_set(runs: &RunSet) -> Self {
        let times = runs.times();
        let costs = runs.costs();
        let rows = runs.rows();
        let (avg_time, median_time, p75_time, p90_time) = summarize_full(&times);
        let (avg_rows, median_rows, p75_rows, p90_rows) = summarize_full(&rows);
        let (avg_cost, median_cost) = summarize_central(&costs);
        Self {
            avg_time,
            median_time,
            p75_time,
            p90_time,
            avg_cost,
            median_cost,
            avg_rows,
            median_rows,
            p75_rows,
            p90_rows,
        }
    }
}

fn summarize_full(xs: &[f64]) -> (Measure<f64>, Measure<f64>, Measure<f64>, Measure<f64>) {
    if xs.is_empty() {
        return (
            Measure::Failed,
            Measure::Failed,
            Measure::Failed,
            Measure::Failed,
        );
    }
    (
        Measure::Value(stats::mean(xs)),
        Measure::Value(stats::median(xs)),
        Measure::from_option(stats::quantile_exclusive(xs, 3, 4)),
        Measure::from_option(stats::quantile_exclusive(xs, 9, 10)),
    )
}

fn summarize_central(xs: &[f64]) -> (Measure<f64>, Measure<f64>) {
    if xs.is_empty() {
        return (Measure::Failed, Measure::Failed);
    }
    (
        Measure::Value(stats::mean(xs)),
        Measure::Value(stats::median(xs)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, cost: f64, rows: i64) -> ExecutionSample {
        ExecutionSample {
            time_ms: Some(time),
            cost: Some(cost),
            rows: Some(rows),
            plan: Some("Seq Scan".into()),
        }
    }

    #[test]
    fn aggregate_matches_hand_computed_stats() {
        let runs = RunSet::new(vec![
            sample(10.0, 100.0, 5),
            sample(12.0, 100.0, 5),
            sample(11.0, 100.0, 5),
            sample(13.0, 100.0, 5),
            sample(14.0, 100.0, 5),
        ]);
        let agg = runs.aggregate();
        assert_eq!(agg.avg_time, Measure::Value(12.0));
        assert_eq!(agg.median_time, Measure::Value(12.0));
        assert_eq!(agg.p75_time, Measure::Value(13.5));
        assert_eq!(agg.avg_cost, Measure::Value(100.0));
        assert_eq!(agg.median_rows, Measure::Value(5.0));
    }

    #[test]
    fn all_failed_runs_aggregate_to_error_marker() {
        let runs = RunSet::new(vec![ExecutionSample::failed(); 5]);
        let agg = runs.aggregate();
        assert!(agg.avg_time.is_failed());
        assert!(agg.p90_time.is_failed());
        assert!(agg.avg_cost.is_failed());
        assert!(agg.median_rows.is_failed());
        assert_eq!(agg.avg_time.field(), "error");
    }

    #[test]
    fn failed_runs_are_excluded_from_aggregation() {
        let runs = RunSet::new(vec![
            sample(10.0, 100.0, 5),
            ExecutionSample::failed(),
            sample(20.0, 200.0, 5),
            sample(30.0, 300.0, 5),
            ExecutionSample::failed(),
        ]);
        let agg = runs.aggregate();
        assert_eq!(agg.avg_time, Measure::Value(20.0));
        assert_eq!(agg.median_cost, Measure::Value(200.0));
    }

    #[test]
    fn cost_missing_on_successful_run_degrades_only_cost() {
        // time present, cost marker absent in plan text
        let runs = RunSet::new(vec![ExecutionSample {
            time_ms: Some(4.2),
            cost: None,
            rows: Some(1),
            plan: None,
        }]);
        let agg = runs.aggregate();
        assert_eq!(agg.avg_time, Measure::Value(4.2));
        assert!(agg.avg_cost.is_failed());
    }

    #[test]
    fn join_key_concatenates_task_and_response() {
        let rec = QueryRecord {
            task_no: "7".into(),
            response_id: "3".into(),
            ..Default::default()
        };
        assert_eq!(rec.join_key(), "7_3");
    }
}
