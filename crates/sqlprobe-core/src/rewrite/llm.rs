//! Chat-completions-backed rewriter: sends the query plus the database
//! fingerprint in a fixed prompt and expects bare SQL back.

use super::{RewriteOutcome, RewriteRequest, Rewriter};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

/// Static facts about the benchmark environment included in every
/// prompt so the model optimizes for the right target.
#[derive(Debug, Clone)]
pub struct EnvironmentInfo {
    pub dbms: String,
    pub version: String,
    pub hosting: String,
    pub data_distribution: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            dbms: "PostgreSQL".into(),
            version: "16".into(),
            hosting: "unspecified".into(),
            data_distribution: "Uniform distribution, no significant skew".into(),
        }
    }
}

pub struct LlmRewriter {
    http: reqwest::Client,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub environment: EnvironmentInfo,
}

impl LlmRewriter {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            environment: EnvironmentInfo::default(),
        }
    }

    fn prompt(&self, request: &RewriteRequest) -> String {
        let fp = &request.fingerprint;
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".into());
        format!(
            "Please rewrite the following SQL query to improve execution time.\n\
             Provide only the optimized SQL query as output, without explanations, \
             comments, or schema modifications.\n\
             \n\
             Initial Query:\n{query}\n\
             \n\
             Database Management System:\n{dbms} (Version: {version})\n\
             \n\
             Hosting Environment:\n{hosting}\n\
             \n\
             Tables Info:\n{tables}\n\
             \n\
             Constraints Info:\n{constraints}\n\
             \n\
             Indexes Info:\n{indexes}\n\
             \n\
             Tables Size:\n{sizes}\n\
             \n\
             Data Distribution:\n{distribution}\n\
             \n\
             Initial Execution Plan:\n{plan}\n",
            query = request.query,
            dbms = self.environment.dbms,
            version = self.environment.version,
            hosting = self.environment.hosting,
            tables = or_na(&fp.table_info),
            constraints = or_na(&fp.constraint_info),
            indexes = or_na(&fp.index_info),
            sizes = or_na(&fp.table_size),
            distribution = self.environment.data_distribution,
            plan = or_na(&fp.execution_plan),
        )
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl Rewriter for LlmRewriter {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteOutcome> {
        let prompt = self.prompt(request);
        let start = Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "max_tokens": 500,
                "temperature": 0.1,
            }))
            .send()
            .await
            .context("rewrite request failed")?
            .error_for_status()
            .context("rewrite request rejected")?;
        let parsed: ChatResponse = response
            .json()
            .await
            .context("malformed chat completion response")?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        let sql = strip_sql_fences(&content);
        if sql.is_empty() {
            bail!("empty rewrite response");
        }

        Ok(RewriteOutcome {
            name: request.name.clone(),
            input_sql: request.query.clone(),
            input_cost: super::UNKNOWN_COST,
            output_sql: Some(sql),
            output_cost: super::UNKNOWN_COST,
            used_rules: Vec::new(),
            rewrite_time_ms: elapsed_ms,
        })
    }
}

/// Strips markdown ```sql fences that chat models like to wrap SQL in.
pub fn strip_sql_fences(text: &str) -> String {
    text.replace("```sql", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DbFingerprint;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_sql_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_sql_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_sql_fences("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn prompt_carries_query_and_fingerprint() {
        let rewriter = LlmRewriter::new("http://localhost/v1/chat/completions", "k", "m");
        let request = RewriteRequest {
            name: "q1".into(),
            query: "SELECT * FROM users".into(),
            schema_ddl: vec![],
            budget: 20,
            db: Default::default(),
            fingerprint: DbFingerprint {
                table_info: Some("users(id int)".into()),
                index_info: Some("users_pkey".into()),
                ..Default::default()
            },
        };
        let prompt = rewriter.prompt(&request);
        assert!(prompt.contains("SELECT * FROM users"));
        assert!(prompt.contains("users(id int)"));
        assert!(prompt.contains("users_pkey"));
        // Absent fingerprint fields degrade to N/A, not to empty sections
        assert!(prompt.contains("Constraints Info:\nN/A"));
    }
}
