//! Classification evaluation
//!
//! Accuracy, precision/recall/F1, ROC curves with AUC and confusion
//! matrices, computed per fold by the [`Evaluator`].

mod evaluator;
pub mod metrics;

pub use evaluator::{ByClass, Evaluator, Metrics};
pub use metrics::{accuracy, auc, precision_recall_f1, roc_auc, roc_curve, ConfusionMatrix, RocCurve};
