//! Kolosal CV - Repeated, parallel cross-validation for classifiers
//!
//! This crate estimates how well a classifier generalizes on tabular data:
//! - Seeded K-fold partitioning with one worker per fold
//! - Optional recursive feature elimination inside each fold
//! - Optional nested grid search over the model's hyperparameters
//! - Accuracy, precision/recall/F1, ROC/AUC and confusion matrices,
//!   aggregated across folds
//!
//! # Modules
//!
//! ## Core
//! - [`pipeline`] - Fold pipeline, orchestrator and aggregation
//! - [`training`] - Classifiers, model factory and fold splitters
//! - [`selection`] - Cross-validated recursive feature elimination
//! - [`search`] - Parameter grids and grid search
//! - [`evaluation`] - Classification metrics
//!
//! ## Collaborators
//! - [`data`] - Datasets and file loading
//! - [`report`] - JSON and tab-separated result writers
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use kolosal_cv::prelude::*;
//!
//! # fn main() -> kolosal_cv::Result<()> {
//! let dataset = DataLoader::new().with_header(true).load("iris.csv")?;
//! let config = CvConfig::new(ModelKind::LogisticRegression).with_grid_search(true);
//! let result = CrossValidationOrchestrator::new(config)?.run(&dataset)?;
//! println!("accuracy {:.3} ± {:.3}", result.accuracy_mean, result.accuracy_std);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod data;
pub mod training;
pub mod selection;
pub mod search;
pub mod evaluation;
pub mod pipeline;

// Services
pub mod report;
pub mod cli;

pub use error::{CvError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CvError, Result};

    // Configuration
    pub use crate::config::{CvConfig, ModelKind};

    // Data
    pub use crate::data::{DataLoader, Dataset};

    // Training
    pub use crate::training::{Classifier, ClassifierModel, CrossValidator, CVStrategy, ModelFactory};

    // Selection and search
    pub use crate::search::{GridSearch, ParamGrid, ParamSet, ParamValue};
    pub use crate::selection::FeatureSelector;

    // Evaluation
    pub use crate::evaluation::{Evaluator, Metrics};

    // Pipeline
    pub use crate::pipeline::{AggregateResult, CrossValidationOrchestrator, FoldResult, RunReport};
}
