//! Dataset representation and loading

mod dataset;
mod loader;

pub use dataset::{distinct_labels, Dataset};
pub use loader::DataLoader;
