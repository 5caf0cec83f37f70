pub mod compare;
pub mod config;
pub mod corpus;
pub mod db;
pub mod engine;
pub mod equivalence;
pub mod errors;
pub mod model;
pub mod plan;
pub mod profiler;
pub mod report;
pub mod rewrite;
pub mod stats;
