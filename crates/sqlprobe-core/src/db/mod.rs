//! Database boundary: an explicit session handle plus instance-level
//! maintenance operations, with a scripted fake for tests.

use anyhow::Result;
use async_trait::async_trait;

pub mod fake;
pub mod postgres;

pub use postgres::PgDatabase;

/// A rectangular result set in positional text form. Column names are
/// discarded on purpose: only column count and cell values matter, which
/// keeps comparisons independent of `AS` aliasing introduced by rewrites.
/// `None` cells are SQL NULLs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub columns: usize,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultTable {
    /// First column of every row, for single-column output such as
    /// EXPLAIN plans. NULL cells become empty lines.
    pub fn first_column_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.first().and_then(|c| c.clone()).unwrap_or_default())
            .collect()
    }
}

/// One live database session, exclusively owned by the measurement loop.
#[async_trait]
pub trait SqlSession: Send {
    /// Execute a statement, discarding any result rows.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Execute a query and fetch the full result set.
    async fn query(&mut self, sql: &str) -> Result<ResultTable>;
}

/// Session factory plus the cold-cache reset primitive.
#[async_trait]
pub trait Database: Send + Sync {
    async fn session(&self) -> Result<Box<dyn SqlSession>>;

    /// Best-effort reset of runtime configuration overrides and server
    /// statistics, run on a fresh autocommit connection before each timed
    /// execution. Reset failures are logged and swallowed: approximate
    /// comparability is acceptable, aborting the experiment is not.
    async fn reset_statistics(&self);
}
