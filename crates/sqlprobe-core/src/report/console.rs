//! Console progress output for the measurement and comparison loops.

use crate::equivalence::PairVerdict;
use crate::model::{ExecutionSample, QueryRecord};

pub fn warming_up(record: &QueryRecord) {
    eprintln!(
        "\n[Task {} | Response {}] warming up before measurement...",
        label(&record.task_no),
        label(&record.response_id)
    );
}

pub fn run_finished(record: &QueryRecord, run: usize, total: usize, sample: &ExecutionSample) {
    eprintln!(
        "\n[Task {} | Response {}]",
        label(&record.task_no),
        label(&record.response_id)
    );
    eprintln!("[RUN {run}/{total}]");
    match sample.time_ms {
        Some(t) => eprintln!("   - Execution Time: {t:.4} ms"),
        None => eprintln!("   - Execution Time: n/a"),
    }
    eprintln!("   - Query Cost:     {}", display(sample.cost));
    eprintln!("   - Rows Returned:  {}", display(sample.rows));
}

pub fn comparing_row(idx: usize, total: usize) {
    eprintln!("Comparing row {}/{}", idx + 1, total);
}

pub fn pair_verdict(verdict: &PairVerdict) {
    eprintln!(
        "Result: ordered = {}, set-based = {}",
        verdict.ordered, verdict.set_based
    );
}

fn label(s: &str) -> &str {
    if s.is_empty() {
        "N/A"
    } else {
        s
    }
}

fn display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into())
}
