//! Hyperparameter search
//!
//! Ordered parameter grids and exhaustive grid search scored by inner
//! stratified cross-validation.

mod grid_search;
mod params;

pub use grid_search::{CandidateResult, GridSearch, GridSearchResult};
pub use params::{linspace, ParamGrid, ParamSet, ParamValue};
