//! Feature selection
//!
//! Recursive feature elimination whose subset size is chosen by inner
//! cross-validation.

mod rfe;

pub use rfe::{FeatureSelection, FeatureSelector};
