pub mod runner;

pub use runner::{ExperimentRunner, DEFAULT_RUNS};
