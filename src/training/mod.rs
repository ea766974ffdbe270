//! Model training module
//!
//! The classifiers the cross-validation pipeline can drive:
//! - Random Forests (built from CART decision trees)
//! - Support Vector Machines with linear or RBF kernels
//! - Logistic regression
//!
//! plus the [`ModelFactory`] that maps a [`crate::config::ModelKind`] to a model
//! and its search grid, and the fold splitters.

mod factory;
mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod logistic;
pub mod random_forest;
pub mod svm;

pub use cross_validation::{CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{DecisionTree, TreeNode};
pub use factory::ModelFactory;
pub use logistic::LogisticRegression;
pub use models::{Classifier, ClassifierModel};
pub use random_forest::{MaxFeatures, RandomForest};
pub use svm::{KernelType, SVMClassifier, SVMConfig};
