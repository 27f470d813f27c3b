pub mod runner;

pub use runner::{BatchRunner, BatchSummary, ItemOutcome, RunnerConfig};
