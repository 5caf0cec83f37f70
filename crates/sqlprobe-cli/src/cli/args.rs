use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqlprobe",
    version,
    about = "Measurement harness for SQL query rewrites on PostgreSQL"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Measure every query in a corpus over repeated profiled runs
    Run(RunArgs),
    /// Check result-set equivalence of (original, rewritten) query pairs
    Compare(CompareArgs),
    /// Statistically compare baseline and rewritten measurement files
    Analyze(AnalyzeArgs),
    /// Rewrite corpus queries through an LLM endpoint
    Rewrite(RewriteArgs),
    /// Write a sample configuration file
    Init(InitArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "sqlprobe.yaml")]
    pub config: PathBuf,

    /// Corpus CSV; measured columns are written back into this file
    #[arg(long)]
    pub corpus: PathBuf,

    /// Override the measured runs per query from the config
    #[arg(long)]
    pub runs: Option<usize>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value = "sqlprobe.yaml")]
    pub config: PathBuf,

    /// CSV carrying both queries of every pair
    #[arg(long)]
    pub pairs: PathBuf,

    #[arg(long, default_value = "Initial Query")]
    pub initial_col: String,

    #[arg(long, default_value = "Optimized query")]
    pub optimized_col: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Measurement CSV for the original queries
    #[arg(long)]
    pub baseline: PathBuf,

    /// Measurement CSV for the rewritten queries
    #[arg(long)]
    pub rewritten: PathBuf,

    /// Equivalence-check CSV produced by `compare`
    #[arg(long)]
    pub equivalence: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    /// Which equivalence verdict column to carry into the report
    #[arg(long, default_value = "except_equal")]
    pub equivalence_col: String,

    /// Per-run columns to read from each measurement file
    #[arg(long, default_value_t = sqlprobe_core::engine::DEFAULT_RUNS)]
    pub runs: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RewriteArgs {
    #[arg(long, default_value = "sqlprobe.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub corpus: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    /// JSONL rewrite log; rows already present are skipped on re-run
    #[arg(long, default_value = "rewrites.jsonl")]
    pub log: PathBuf,

    /// Schema DDL file, statements separated by `;`
    #[arg(long)]
    pub schema: Option<PathBuf>,

    #[arg(long, default_value = "https://api.deepseek.com/chat/completions")]
    pub api_url: String,

    #[arg(long, env = "SQLPROBE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, default_value = "deepseek-chat")]
    pub model: String,

    /// Override the rewrite budget from the config
    #[arg(long)]
    pub budget: Option<u32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "sqlprobe.yaml")]
    pub path: PathBuf,
}
