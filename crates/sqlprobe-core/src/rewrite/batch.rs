//! Batch driver for rewrite engines: walks a corpus, skips rows already
//! present in the rewrite log, fills planner cost estimates around every
//! engine call and persists the outcome columns row by row.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use super::log::RewriteLog;
use super::{RewriteOutcome, RewriteRequest, Rewriter, UNKNOWN_COST};
use crate::config::DbConfig;
use crate::corpus::Sheet;
use crate::db::SqlSession;
use crate::profiler;

/// Per-batch counters reported back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rewritten: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct RewriteBatch<'a> {
    pub rewriter: &'a dyn Rewriter,
    pub db_config: DbConfig,
    pub schema_ddl: Vec<String>,
    pub budget: u32,
}

impl RewriteBatch<'_> {
    /// Rewrites every non-blank corpus row whose name is not already in
    /// `history`. An engine failure marks the row with the fallback
    /// outcome (original query, its estimated cost, no rewrite) and the
    /// loop moves on to the next row. Each outcome is appended to the
    /// log and the sheet is saved to `out` before the next row starts.
    pub async fn run(
        &self,
        session: &mut dyn SqlSession,
        sheet: &mut Sheet,
        out: &Path,
        log: &mut RewriteLog,
        history: &HashSet<String>,
    ) -> Result<BatchSummary> {
        let columns = OutputColumns::ensure(sheet);
        let mut summary = BatchSummary::default();

        for idx in 0..sheet.len() {
            let record = sheet.query_record(idx);
            if record.is_blank() {
                continue;
            }
            let name = if record.id.is_empty() {
                record.join_key()
            } else {
                record.id.clone()
            };
            if history.contains(&name) {
                tracing::debug!(name = %name, "already rewritten, skipping");
                summary.skipped += 1;
                continue;
            }
            tracing::info!(engine = self.rewriter.name(), name = %name, "rewriting query");

            let input_cost = estimate(session, &record.query).await;
            let request = RewriteRequest {
                name: name.clone(),
                query: record.query.clone(),
                schema_ddl: self.schema_ddl.clone(),
                budget: self.budget,
                db: self.db_config.clone(),
                fingerprint: record.fingerprint.clone(),
            };

            let start = Instant::now();
            let mut outcome = match self.rewriter.rewrite(&request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "rewrite failed");
                    summary.failed += 1;
                    RewriteOutcome::failed(
                        &name,
                        &record.query,
                        input_cost,
                        start.elapsed().as_millis() as u64,
                    )
                }
            };
            if outcome.input_cost == UNKNOWN_COST {
                if let Some(cost) = input_cost {
                    outcome.input_cost = cost;
                }
            }
            if let Some(sql) = &outcome.output_sql {
                if outcome.output_cost == UNKNOWN_COST {
                    if let Some(cost) = estimate(session, sql).await {
                        outcome.output_cost = cost;
                    }
                }
                summary.rewritten += 1;
            }

            columns.write(sheet, idx, &outcome);
            log.append(&outcome)?;
            sheet.save(out)?;
        }
        Ok(summary)
    }
}

/// Plain-EXPLAIN cost estimate; estimation failures degrade to "no
/// estimate" instead of aborting the batch.
async fn estimate(session: &mut dyn SqlSession, query: &str) -> Option<f64> {
    match profiler::estimate_cost(session, query).await {
        Ok(cost) => cost,
        Err(e) => {
            tracing::warn!(error = %e, "cost estimation failed");
            None
        }
    }
}

struct OutputColumns {
    optimized: usize,
    input_cost: usize,
    output_cost: usize,
    used_rules: usize,
    rewrite_time: usize,
}

impl OutputColumns {
    fn ensure(sheet: &mut Sheet) -> Self {
        Self {
            optimized: sheet.ensure_column("Optimized Query"),
            input_cost: sheet.ensure_column("Input Cost"),
            output_cost: sheet.ensure_column("Output Cost"),
            used_rules: sheet.ensure_column("Used Rules"),
            rewrite_time: sheet.ensure_column("Rewrite Time"),
        }
    }

    fn write(&self, sheet: &mut Sheet, idx: usize, outcome: &RewriteOutcome) {
        let sql = outcome.output_sql.clone().unwrap_or_else(|| "error".into());
        sheet.set(idx, self.optimized, sql);
        sheet.set(idx, self.input_cost, cost_cell(outcome.input_cost));
        sheet.set(idx, self.output_cost, cost_cell(outcome.output_cost));
        sheet.set(idx, self.used_rules, outcome.used_rules.join(", "));
        sheet.set(idx, self.rewrite_time, outcome.rewrite_time_ms.to_string());
    }
}

fn cost_cell(cost: f64) -> String {
    if cost == UNKNOWN_COST {
        "error".into()
    } else {
        cost.to_string()
    }
}
