//! Cross-validation pipeline
//!
//! Each outer fold runs feature selection (optional), then the grid search
//! or a direct fit, then evaluation. The orchestrator fans the folds out to
//! a worker pool and aggregates their results.

mod fold;
mod orchestrator;
mod results;

pub use fold::{FoldResult, FoldTask};
pub use orchestrator::CrossValidationOrchestrator;
pub use results::{mean_std, AggregateResult, RunReport, SUMMARY_METRICS};
