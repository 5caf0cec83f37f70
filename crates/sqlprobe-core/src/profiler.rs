//! Single-execution profiler: one query, one diagnostic run, four
//! independently-degrading fields.

use crate::db::SqlSession;
use crate::model::ExecutionSample;
use crate::plan;
use anyhow::Result;

/// Runs one query under `EXPLAIN (ANALYZE, BUFFERS, TIMING OFF)` with
/// intra-query parallel workers disabled, so costs stay comparable
/// regardless of available parallelism. Any execution failure yields a
/// fully-failed sample and leaves the session usable; missing plan
/// markers degrade only their own field.
pub async fn profile(session: &mut dyn SqlSession, query: &str) -> ExecutionSample {
    match try_profile(session, query).await {
        Ok(sample) => sample,
        Err(e) => {
            tracing::warn!(error = %e, "query profiling failed");
            ExecutionSample::failed()
        }
    }
}

async fn try_profile(session: &mut dyn SqlSession, query: &str) -> Result<ExecutionSample> {
    session
        .execute("SET max_parallel_workers_per_gather = 0;")
        .await?;
    let table = session
        .query(&format!("EXPLAIN (ANALYZE, BUFFERS, TIMING OFF) {query}"))
        .await?;
    let lines = table.first_column_lines();
    let summary = plan::parse_plan_lines(&lines);
    Ok(ExecutionSample {
        time_ms: summary.execution_time_ms,
        cost: summary.total_cost,
        rows: summary.actual_rows,
        plan: if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        },
    })
}

/// Planner cost estimate without executing the query (`EXPLAIN` alone).
/// Used by the rewriter fallback path to still report the original
/// query's cost when a rewrite engine errors out.
pub async fn estimate_cost(session: &mut dyn SqlSession, query: &str) -> Result<Option<f64>> {
    let table = session.query(&format!("EXPLAIN {query}")).await?;
    Ok(plan::parse_plan_lines(&table.first_column_lines()).total_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fake::{FakeDatabase, Response};
    use crate::db::Database;

    #[tokio::test]
    async fn profile_extracts_fields_from_plan() {
        let db = FakeDatabase::new();
        db.on_contains(
            "EXPLAIN (ANALYZE, BUFFERS, TIMING OFF)",
            Response::Lines(vec![
                "Seq Scan on t  (cost=0.00..123.45 rows=10 width=8) (actual rows=10 loops=1)"
                    .into(),
                "Execution Time: 2.500 ms".into(),
            ]),
        );
        let mut session = db.session().await.unwrap();
        let sample = profile(session.as_mut(), "SELECT * FROM t").await;
        assert_eq!(sample.time_ms, Some(2.5));
        assert_eq!(sample.cost, Some(123.45));
        assert_eq!(sample.rows, Some(10));
        assert!(sample.plan.unwrap().contains("Seq Scan"));
    }

    #[tokio::test]
    async fn profile_failure_yields_failed_sample() {
        let db = FakeDatabase::new();
        db.on_contains("broken", Response::Error("syntax error".into()));
        let mut session = db.session().await.unwrap();
        let sample = profile(session.as_mut(), "SELECT broken FROM").await;
        assert!(sample.is_failed());
        assert_eq!(sample, crate::model::ExecutionSample::failed());
    }

    #[tokio::test]
    async fn profile_disables_parallel_workers_first() {
        let db = FakeDatabase::new();
        let mut session = db.session().await.unwrap();
        let _ = profile(session.as_mut(), "SELECT 1").await;
        let executed = db.executed();
        assert!(executed[0].contains("max_parallel_workers_per_gather = 0"));
    }

    #[tokio::test]
    async fn estimate_cost_uses_plain_explain() {
        let db = FakeDatabase::new();
        db.on_contains(
            "EXPLAIN SELECT",
            Response::Lines(vec![
                "Seq Scan on t  (cost=0.00..55.30 rows=100 width=8)".into()
            ]),
        );
        let mut session = db.session().await.unwrap();
        let cost = estimate_cost(session.as_mut(), "SELECT * FROM t")
            .await
            .unwrap();
        assert_eq!(cost, Some(55.30));
    }
}
