use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection parameters for the benchmark database. Threaded explicitly
/// through every operation that needs a session; nothing global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbConfig {
    pub dbname: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dbname: "postgres".into(),
            user: default_user(),
            password: String::new(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl DbConfig {
    /// libpq-style key/value connection string.
    pub fn conn_string(&self) -> String {
        let mut s = format!(
            "host={} port={} user={} dbname={}",
            self.host, self.port, self.user, self.dbname
        );
        if !self.password.is_empty() {
            s.push_str(" password=");
            s.push_str(&self.password);
        }
        s
    }
}

fn default_user() -> String {
    "postgres".into()
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    5432
}

/// Experiment-wide settings loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub db: DbConfig,
    /// Measured executions per query, after one discarded warm-up.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Transformation budget handed to rewrite engines.
    #[serde(default = "default_budget")]
    pub rewrite_budget: u32,
}

fn default_runs() -> usize {
    crate::engine::runner::DEFAULT_RUNS
}

fn default_budget() -> u32 {
    20
}

pub fn load_config(path: &Path) -> Result<ExperimentConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: ExperimentConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {e}")))?;
    if cfg.runs == 0 {
        return Err(ConfigError("runs must be at least 1".into()));
    }
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(
        path,
        r#"db:
  dbname: leetcode_uniform
  user: postgres
  password: ""
  host: localhost
  port: 5432
runs: 5
rewrite_budget: 20
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_string_omits_empty_password() {
        let cfg = DbConfig {
            dbname: "bench".into(),
            ..Default::default()
        };
        assert_eq!(
            cfg.conn_string(),
            "host=localhost port=5432 user=postgres dbname=bench"
        );
    }

    #[test]
    fn sample_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlprobe.yaml");
        write_sample_config(&path).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.runs, 5);
        assert_eq!(cfg.rewrite_budget, 20);
        assert_eq!(cfg.db.dbname, "leetcode_uniform");
    }

    #[test]
    fn zero_runs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "db:\n  dbname: bench\nruns: 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("runs must be at least 1"));
    }
}
