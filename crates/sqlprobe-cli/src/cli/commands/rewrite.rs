use sqlprobe_core::config::load_config;
use sqlprobe_core::corpus::Sheet;
use sqlprobe_core::db::{Database, PgDatabase};
use sqlprobe_core::rewrite::batch::RewriteBatch;
use sqlprobe_core::rewrite::llm::LlmRewriter;
use sqlprobe_core::rewrite::log::RewriteLog;

use super::exit_codes;
use crate::cli::args::RewriteArgs;

pub async fn run(args: RewriteArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)?;
    let budget = args.budget.unwrap_or(cfg.rewrite_budget);

    let mut sheet = Sheet::load(&args.corpus)?;
    let schema_ddl = match &args.schema {
        Some(path) => load_schema(path)?,
        None => Vec::new(),
    };

    // Names already in the log were rewritten by an earlier invocation
    // and are skipped, so an interrupted batch resumes where it stopped.
    let history = RewriteLog::history(&args.log)?;
    let mut log = RewriteLog::open(&args.log)?;

    let rewriter = LlmRewriter::new(&args.api_url, &args.api_key, &args.model);
    let db = PgDatabase::new(cfg.db.clone());
    let mut session = db.session().await?;

    let batch = RewriteBatch {
        rewriter: &rewriter,
        db_config: cfg.db,
        schema_ddl,
        budget,
    };
    let summary = batch
        .run(session.as_mut(), &mut sheet, &args.out, &mut log, &history)
        .await?;

    eprintln!(
        "rewrote {} queries ({} failed, {} skipped), results in {}",
        summary.rewritten,
        summary.failed,
        summary.skipped,
        args.out.display()
    );
    Ok(exit_codes::OK)
}

fn load_schema(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read schema {}: {e}", path.display()))?;
    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
