mod analyze;
mod compare;
mod init;
mod rewrite;
mod run;

use crate::cli::args::{Cli, Command};

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Compare(args) => compare::run(args).await,
        Command::Analyze(args) => analyze::run(args).await,
        Command::Rewrite(args) => rewrite::run(args).await,
        Command::Init(args) => init::run(args),
    }
}
