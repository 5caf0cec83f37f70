use std::collections::HashMap;

use sqlprobe_core::compare::{compare_run_sets, ComparisonVerdict, RunSetSide};
use sqlprobe_core::corpus::Sheet;
use sqlprobe_core::model::Measure;

use super::exit_codes;
use crate::cli::args::AnalyzeArgs;

const REPORT_HEADERS: &[&str] = &[
    "TaskNo",
    "ResponseId",
    "Difficulty",
    "normality_initial",
    "normality_optimized",
    "variance_initial",
    "variance_optimized",
    "variance_equality",
    "performance_difference",
    "p_value_mannwhitney",
    "avg_pg_time_diff",
    "median_pg_time_diff",
    "avg_cost_diff",
    "avg_rows_diff",
    "equivalent_query",
];

pub async fn run(args: AnalyzeArgs) -> anyhow::Result<i32> {
    let baseline = Sheet::load(&args.baseline)?;
    let rewritten = Sheet::load(&args.rewritten)?;
    let equivalence = Sheet::load(&args.equivalence)?;

    if equivalence.column(&args.equivalence_col).is_none() {
        anyhow::bail!(
            "equivalence file has no column named {:?}",
            args.equivalence_col
        );
    }

    let baseline_by_key = index_by_join_key(&baseline);
    let equivalence_by_key = index_by_join_key(&equivalence);

    let mut report = Sheet::new(REPORT_HEADERS.iter().map(|h| h.to_string()).collect());

    let mut unmatched = 0usize;
    for idx in 0..rewritten.len() {
        let record = rewritten.query_record(idx);
        let key = record.join_key();

        let Some(&baseline_idx) = baseline_by_key.get(&key) else {
            tracing::warn!(key = %key, "no baseline row for rewritten row, skipping");
            unmatched += 1;
            continue;
        };

        let equivalent = equivalence_by_key
            .get(&key)
            .and_then(|&i| equivalence.get(i, &args.equivalence_col))
            .unwrap_or("")
            .to_string();

        let mut row = vec![
            record.task_no.clone(),
            record.response_id.clone(),
            record.difficulty.clone().unwrap_or_default(),
        ];
        row.extend(stat_cells(
            &baseline,
            baseline_idx,
            &rewritten,
            idx,
            args.runs,
        ));
        row.push(equivalent);
        report.push_row(row);
    }

    report.save(&args.out)?;
    eprintln!(
        "analyzed {} pairs ({} rewritten rows without a baseline match), report in {}",
        report.len(),
        unmatched,
        args.out.display()
    );
    Ok(exit_codes::OK)
}

fn index_by_join_key(sheet: &Sheet) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for idx in 0..sheet.len() {
        let key = sheet.query_record(idx).join_key();
        if key != "_" {
            index.entry(key).or_insert(idx);
        }
    }
    index
}

/// The statistical cells for one pair. Rows whose timing samples
/// cannot all be read, or whose comparison is undefined, carry the
/// literal marker in every cell rather than partial numbers.
fn stat_cells(
    baseline: &Sheet,
    baseline_idx: usize,
    rewritten: &Sheet,
    rewritten_idx: usize,
    runs: usize,
) -> Vec<String> {
    let sides = (
        read_side(baseline, baseline_idx, runs),
        read_side(rewritten, rewritten_idx, runs),
    );
    let verdict = match sides {
        (Some(base), Some(rewr)) => compare_run_sets(&base, &rewr),
        _ => return vec!["error".to_string(); 11],
    };
    match verdict {
        Ok(v) => render_verdict(&v),
        Err(e) => {
            tracing::warn!(error = %e, "statistical comparison failed");
            vec!["error".to_string(); 11]
        }
    }
}

fn render_verdict(v: &ComparisonVerdict) -> Vec<String> {
    vec![
        v.normality_baseline.to_string(),
        v.normality_rewritten.to_string(),
        v.variance_baseline.to_string(),
        v.variance_rewritten.to_string(),
        v.variance_equality.to_string(),
        v.significance.to_string(),
        v.p_value.to_string(),
        v.avg_time_delta.field(),
        v.median_time_delta.field(),
        v.avg_cost_delta.field(),
        v.avg_rows_delta.field(),
    ]
}

/// All `runs` timing samples must parse for the side to be usable; a
/// single failed run poisons the whole comparison for that pair.
fn read_side(sheet: &Sheet, idx: usize, runs: usize) -> Option<RunSetSide> {
    let mut times = Vec::with_capacity(runs);
    for run in 1..=runs {
        let cell = sheet.get(idx, &format!("time_pg_{run}"))?;
        times.push(cell.trim().parse::<f64>().ok()?);
    }
    Some(RunSetSide {
        times,
        avg_time: parse_measure(sheet.get(idx, "avg_pg_time")),
        median_time: parse_measure(sheet.get(idx, "median_pg_time")),
        avg_cost: parse_measure(sheet.get(idx, "avg_cost")),
        avg_rows: parse_measure(sheet.get(idx, "avg_rows")),
    })
}

fn parse_measure(cell: Option<&str>) -> Measure<f64> {
    match cell.and_then(|c| c.trim().parse::<f64>().ok()) {
        Some(v) => Measure::Value(v),
        None => Measure::Failed,
    }
}
