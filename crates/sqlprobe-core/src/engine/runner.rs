//! The multi-run aggregator: drives the cache resetter and profiler over
//! a query corpus and persists per-run and aggregate columns.

use crate::corpus::Sheet;
use crate::db::Database;
use crate::model::{AggregateStats, ExecutionSample, RunSet};
use crate::profiler;
use crate::report::console;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_RUNS: usize = 5;

pub struct ExperimentRunner<'a> {
    pub db: &'a dyn Database,
    /// Measured executions per query; one extra warm-up run is taken and
    /// discarded before these.
    pub runs: usize,
}

impl<'a> ExperimentRunner<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self {
            db,
            runs: DEFAULT_RUNS,
        }
    }

    /// Measures every record in the sheet and writes results back to
    /// `path` after each record. A failing query marks its own columns
    /// and the loop moves on; only a failed initial connection aborts.
    pub async fn run_corpus(&self, sheet: &mut Sheet, path: &Path) -> Result<()> {
        let columns = ResultColumns::ensure(sheet, self.runs);
        let mut session = self.db.session().await?;

        for idx in 0..sheet.len() {
            let record = sheet.query_record(idx);
            if record.is_blank() {
                tracing::debug!(row = idx, "skipping blank query");
                continue;
            }

            // Discarded warm-up so the measured runs see steady-state
            // caches instead of cold-start cost.
            console::warming_up(&record);
            self.db.reset_statistics().await;
            let _ = profiler::profile(session.as_mut(), &record.query).await;

            let mut samples = Vec::with_capacity(self.runs);
            for run in 1..=self.runs {
                self.db.reset_statistics().await;
                let sample = profiler::profile(session.as_mut(), &record.query).await;
                columns.write_run(sheet, idx, run, &sample);
                if !sample.is_failed() {
                    console::run_finished(&record, run, self.runs, &sample);
                }
                samples.push(sample);
            }

            let aggregate = RunSet::new(samples).aggregate();
            columns.write_aggregate(sheet, idx, &aggregate);
            sheet.save(path)?;
        }
        Ok(())
    }
}

/// Column indexes for the per-run and aggregate result columns, resolved
/// once up front. `ensure_column` reuses existing columns, so re-running
/// over an already-measured corpus overwrites in place.
struct ResultColumns {
    per_run: Vec<RunColumns>,
    avg_time: usize,
    median_time: usize,
    p75_time: usize,
    p90_time: usize,
    avg_cost: usize,
    median_cost: usize,
    avg_rows: usize,
    median_rows: usize,
    p75_rows: usize,
    p90_rows: usize,
}

struct RunColumns {
    time: usize,
    cost: usize,
    rows: usize,
    plan: usize,
}

impl ResultColumns {
    fn ensure(sheet: &mut Sheet, runs: usize) -> Self {
        let per_run = (1..=runs)
            .map(|i| RunColumns {
                time: sheet.ensure_column(&format!("time_pg_{i}")),
                cost: sheet.ensure_column(&format!("cost_{i}")),
                rows: sheet.ensure_column(&format!("rows_{i}")),
                plan: sheet.ensure_column(&format!("explain_run_{i}")),
            })
            .collect();
        Self {
            per_run,
            avg_time: sheet.ensure_column("avg_pg_time"),
            median_time: sheet.ensure_column("median_pg_time"),
            p75_time: sheet.ensure_column("p75_pg_time"),
            p90_time: sheet.ensure_column("p90_pg_time"),
            avg_cost: sheet.ensure_column("avg_cost"),
            median_cost: sheet.ensure_column("median_cost"),
            avg_rows: sheet.ensure_column("avg_rows"),
            median_rows: sheet.ensure_column("median_rows"),
            p75_rows: sheet.ensure_column("p75_rows"),
            p90_rows: sheet.ensure_column("p90_rows"),
        }
    }

    fn write_run(&self, sheet: &mut Sheet, idx: usize, run: usize, sample: &ExecutionSample) {
        let cols = &self.per_run[run - 1];
        if sample.is_failed() {
            // The literal marker distinguishes a failed run from a value
            // that was never measured.
            for col in [cols.time, cols.cost, cols.rows, cols.plan] {
                sheet.set(idx, col, "error");
            }
            return;
        }
        sheet.set(idx, cols.time, opt_field(sample.time_ms));
        sheet.set(idx, cols.cost, opt_field(sample.cost));
        sheet.set(idx, cols.rows, opt_field(sample.rows));
        sheet.set(idx, cols.plan, sample.plan.clone().unwrap_or_default());
    }

    fn write_aggregate(&self, sheet: &mut Sheet, idx: usize, agg: &AggregateStats) {
        sheet.set(idx, self.avg_time, agg.avg_time.field());
        sheet.set(idx, self.median_time, agg.median_time.field());
        sheet.set(idx, self.p75_time, agg.p75_time.field());
        sheet.set(idx, self.p90_time, agg.p90_time.field());
        sheet.set(idx, self.avg_cost, agg.avg_cost.field());
        sheet.set(idx, self.median_cost, agg.median_cost.field());
        sheet.set(idx, self.avg_rows, agg.avg_rows.field());
        sheet.set(idx, self.median_rows, agg.median_rows.field());
        sheet.set(idx, self.p75_rows, agg.p75_rows.field());
        sheet.set(idx, self.p90_rows, agg.p90_rows.field());
    }
}

fn opt_field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
