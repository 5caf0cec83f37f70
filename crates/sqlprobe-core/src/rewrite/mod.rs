//! Rewrite engine boundary. Engines (LLM-backed or rule-based) are
//! consumed only through this interface; their failures never abort a
//! batch, callers fall back to reporting the original query's cost.

pub mod batch;
pub mod llm;
pub mod log;

use crate::config::DbConfig;
use crate::model::DbFingerprint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Marker cost for "not estimated".
pub const UNKNOWN_COST: f64 = -1.0;

/// What a rewrite engine is handed: the query, the schema DDL, a
/// transformation budget, and connection parameters for engines that
/// probe the database themselves.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    /// Stable name used for history/resume in the rewrite log.
    pub name: String,
    pub query: String,
    pub schema_ddl: Vec<String>,
    pub budget: u32,
    pub db: DbConfig,
    pub fingerprint: DbFingerprint,
}

/// What every engine reports back, successful or not. `output_sql` is
/// `None` when the engine produced no rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub name: String,
    pub input_sql: String,
    pub input_cost: f64,
    pub output_sql: Option<String>,
    pub output_cost: f64,
    pub used_rules: Vec<String>,
    pub rewrite_time_ms: u64,
}

impl RewriteOutcome {
    /// Failure outcome carrying only the original query and, when one
    /// could be estimated, its cost.
    pub fn failed(name: &str, query: &str, input_cost: Option<f64>, elapsed_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            input_sql: query.to_string(),
            input_cost: input_cost.unwrap_or(UNKNOWN_COST),
            output_sql: None,
            output_cost: UNKNOWN_COST,
            used_rules: Vec::new(),
            rewrite_time_ms: elapsed_ms,
        }
    }
}

#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> anyhow::Result<RewriteOutcome>;
    fn name(&self) -> &'static str;
}
