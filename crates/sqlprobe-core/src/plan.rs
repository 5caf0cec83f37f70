//! Tolerant extraction of summary fields from `EXPLAIN ANALYZE` output.
//!
//! The grammar is PostgreSQL's textual plan format: an implementation
//! targeting a different engine must adapt these patterns. Each field is
//! taken from the first line carrying its marker and degrades to `None`
//! on its own; a missing marker never fails the other fields.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSummary {
    /// Value of the trailing "Execution Time: <float> ms" line.
    pub execution_time_ms: Option<f64>,
    /// Upper bound of the root node's "cost=lower..upper" range.
    pub total_cost: Option<f64>,
    /// "actual rows=<int>" of the root node.
    pub actual_rows: Option<i64>,
}

pub fn parse_plan_lines<S: AsRef<str>>(lines: &[S]) -> PlanSummary {
    PlanSummary {
        execution_time_ms: first_capture(lines, execution_time_re()),
        total_cost: first_capture(lines, cost_re()),
        actual_rows: first_capture(lines, rows_re()),
    }
}

fn first_capture<S: AsRef<str>, T: std::str::FromStr>(lines: &[S], re: &Regex) -> Option<T> {
    lines
        .iter()
        .find_map(|l| re.captures(l.as_ref()))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn execution_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Execution Time:\s*([0-9.]+)\s*ms").expect("valid regex"))
}

fn cost_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"cost=[0-9.]+\.\.([0-9]+\.?[0-9]*)").expect("valid regex"))
}

fn rows_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"actual rows=([0-9]+)").expect("valid regex"))
}
