use sqlprobe_core::config::write_sample_config;

use super::exit_codes;
use crate::cli::args::InitArgs;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.path.exists() {
        eprintln!("{} already exists, not overwriting", args.path.display());
        return Ok(exit_codes::FAILURE);
    }
    write_sample_config(&args.path)?;
    eprintln!("wrote {}", args.path.display());
    Ok(exit_codes::OK)
}
