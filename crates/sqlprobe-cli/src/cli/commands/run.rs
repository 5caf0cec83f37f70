use sqlprobe_core::config::load_config;
use sqlprobe_core::corpus::Sheet;
use sqlprobe_core::db::PgDatabase;
use sqlprobe_core::engine::ExperimentRunner;

use super::exit_codes;
use crate::cli::args::RunArgs;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)?;
    let runs = args.runs.unwrap_or(cfg.runs);
    if runs == 0 {
        anyhow::bail!("--runs must be at least 1");
    }

    let mut sheet = Sheet::load(&args.corpus)?;
    if sheet.is_empty() {
        eprintln!("corpus {} has no rows", args.corpus.display());
        return Ok(exit_codes::FAILURE);
    }

    let db = PgDatabase::new(cfg.db);
    let runner = ExperimentRunner { db: &db, runs };
    runner.run_corpus(&mut sheet, &args.corpus).await?;

    eprintln!(
        "measured {} queries over {} runs each, results in {}",
        sheet.len(),
        runs,
        args.corpus.display()
    );
    Ok(exit_codes::OK)
}
