use sqlprobe_core::config::load_config;
use sqlprobe_core::corpus::Sheet;
use sqlprobe_core::db::{Database, PgDatabase};
use sqlprobe_core::equivalence::compare_pair;
use sqlprobe_core::report::console;

use super::exit_codes;
use crate::cli::args::CompareArgs;

pub async fn run(args: CompareArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)?;
    let mut sheet = Sheet::load(&args.pairs)?;

    if sheet.column(&args.initial_col).is_none() {
        anyhow::bail!("pairs file has no column named {:?}", args.initial_col);
    }
    if sheet.column(&args.optimized_col).is_none() {
        anyhow::bail!("pairs file has no column named {:?}", args.optimized_col);
    }

    let ordered_col = sheet.ensure_column("ordered_equal");
    let set_col = sheet.ensure_column("except_equal");

    let db = PgDatabase::new(cfg.db);
    let mut session = db.session().await?;

    let total = sheet.len();
    for idx in 0..total {
        let original = sheet.get(idx, &args.initial_col).unwrap_or("").to_string();
        let candidate = sheet.get(idx, &args.optimized_col).unwrap_or("").to_string();
        console::comparing_row(idx, total);

        if original.trim().is_empty() || candidate.trim().is_empty() {
            tracing::debug!(row = idx, "skipping pair with missing query");
            continue;
        }

        let verdict = compare_pair(session.as_mut(), &original, &candidate).await;
        console::pair_verdict(&verdict);
        sheet.set(idx, ordered_col, verdict.ordered.to_string());
        sheet.set(idx, set_col, verdict.set_based.to_string());
        sheet.save(&args.pairs)?;
    }

    Ok(exit_codes::OK)
}
