//! Scripted in-memory database for tests: SQL statements are matched by
//! substring against registered responses, and every call is recorded.

use super::{Database, ResultTable, SqlSession};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub enum Response {
    Table(ResultTable),
    /// Single-column rows, as EXPLAIN output arrives.
    Lines(Vec<String>),
    Error(String),
}

#[derive(Default)]
struct Inner {
    responses: Vec<(String, Response)>,
    executed: Vec<String>,
    resets: usize,
}

#[derive(Clone, Default)]
pub struct FakeDatabase {
    inner: Arc<Mutex<Inner>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response for any statement containing `pattern`.
    /// First registered match wins.
    pub fn on_contains(&self, pattern: &str, response: Response) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push((pattern.to_string(), response));
    }

    pub fn rows(cells: Vec<Vec<Option<&str>>>) -> Response {
        let rows: Vec<Vec<Option<String>>> = cells
            .iter()
            .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
            .collect();
        let columns = rows.first().map(|r| r.len()).unwrap_or(0);
        Response::Table(ResultTable { columns, rows })
    }

    pub fn executed(&self) -> Vec<String> {
        self.inner.lock().unwrap().executed.clone()
    }

    pub fn resets(&self) -> usize {
        self.inner.lock().unwrap().resets
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn session(&self) -> Result<Box<dyn SqlSession>> {
        Ok(Box::new(FakeSession {
            inner: self.inner.clone(),
        }))
    }

    async fn reset_statistics(&self) {
        self.inner.lock().unwrap().resets += 1;
    }
}

pub struct FakeSession {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSession {
    fn lookup(&self, sql: &str) -> Option<Response> {
        let mut inner = self.inner.lock().unwrap();
        inner.executed.push(sql.to_string());
        inner
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, r)| r.clone())
    }
}

#[async_trait]
impl SqlSession for FakeSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        match self.lookup(sql) {
            Some(Response::Error(msg)) => bail!("{msg}"),
            _ => Ok(()),
        }
    }

    async fn query(&mut self, sql: &str) -> Result<ResultTable> {
        match self.lookup(sql) {
            Some(Response::Table(table)) => Ok(table),
            Some(Response::Lines(lines)) => Ok(ResultTable {
                columns: 1,
                rows: lines.into_iter().map(|l| vec![Some(l)]).collect(),
            }),
            Some(Response::Error(msg)) => bail!("{msg}"),
            None => Ok(ResultTable::default()),
        }
    }
}
