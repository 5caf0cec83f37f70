use super::{Database, ResultTable, SqlSession};
use crate::config::DbConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// PostgreSQL backend. Sessions speak the simple query protocol, which
/// returns every cell as its text representation regardless of type:
/// exactly what positional result comparison and plan capture need.
pub struct PgDatabase {
    config: DbConfig,
}

impl PgDatabase {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<Client> {
        let (client, connection) = tokio_postgres::connect(&self.config.conn_string(), NoTls)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to {}:{}/{}",
                    self.config.host, self.config.port, self.config.dbname
                )
            })?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "postgres connection task terminated");
            }
        });
        Ok(client)
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn session(&self) -> Result<Box<dyn SqlSession>> {
        let client = self.connect().await?;
        Ok(Box::new(PgSession { client }))
    }

    async fn reset_statistics(&self) {
        match self.connect().await {
            Ok(client) => {
                if let Err(e) = client.batch_execute("RESET ALL; SELECT pg_stat_reset();").await {
                    tracing::warn!(error = %e, "cache reset failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "cache reset connection failed"),
        }
    }
}

pub struct PgSession {
    client: Client,
}

#[async_trait]
impl SqlSession for PgSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .await
            .with_context(|| format!("statement failed: {sql}"))?;
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<ResultTable> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .with_context(|| format!("query failed: {sql}"))?;
        let mut table = ResultTable::default();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(desc) => {
                    table.columns = desc.len();
                }
                SimpleQueryMessage::Row(row) => {
                    table.columns = row.len();
                    table.rows.push(
                        (0..row.len())
                            .map(|i| row.get(i).map(str::to_string))
                            .collect(),
                    );
                }
                _ => {}
            }
        }
        Ok(table)
    }
}
