//! Aggregation of fold results

use super::fold::FoldResult;
use crate::config::CvConfig;
use crate::data::distinct_labels;
use crate::evaluation::{ByClass, ConfusionMatrix};
use serde::Serialize;
use std::collections::BTreeMap;

/// Metric names summarized across folds
pub const SUMMARY_METRICS: [&str; 5] = ["accuracy", "f1", "precision", "recall", "auc"];

/// Summary of a whole cross-validation run
///
/// Means and standard deviations skip undefined values; a metric with no
/// defined value in any fold is `NaN` (serialized as `null`).
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub accuracy_mean: f64,
    pub accuracy_std: f64,
    pub f1_mean: f64,
    pub f1_std: f64,
    pub precision_mean: f64,
    pub precision_std: f64,
    pub recall_mean: f64,
    pub recall_std: f64,
    pub auc_mean: f64,
    pub auc_std: f64,
    /// Fold results ordered by fold index
    pub cv: Vec<FoldResult>,
    /// Confusion matrix of all folds' test and predicted labels together
    pub confusion: Vec<Vec<usize>>,
    /// Row and column labels of `confusion`
    pub labels: Vec<f64>,
    pub config: CvConfig,
}

/// Finite values of one metric in one fold
fn fold_values(fold: &FoldResult, metric: &str) -> Vec<f64> {
    let flatten = |by_class: &ByClass<f64>| -> Vec<f64> {
        by_class.values().into_iter().copied().collect()
    };
    let values: Vec<f64> = match metric {
        "accuracy" => vec![fold.metrics.accuracy],
        "f1" => flatten(&fold.metrics.f1),
        "precision" => flatten(&fold.metrics.precision),
        "recall" => flatten(&fold.metrics.recall),
        "auc" => fold.metrics.auc.values().into_iter().filter_map(|v| *v).collect(),
        _ => Vec::new(),
    };
    values.into_iter().filter(|v| v.is_finite()).collect()
}

/// Mean and population standard deviation; `NaN` for no values
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

impl AggregateResult {
    /// Sort folds by index, summarize each metric, pool the labels
    pub fn from_folds(mut folds: Vec<FoldResult>, config: CvConfig) -> Self {
        folds.sort_by_key(|f| f.fold);

        let stats: BTreeMap<&str, (f64, f64)> = SUMMARY_METRICS
            .iter()
            .map(|&metric| {
                let values: Vec<f64> = folds.iter().flat_map(|f| fold_values(f, metric)).collect();
                (metric, mean_std(&values))
            })
            .collect();
        let stat = |metric: &str| stats.get(metric).copied().unwrap_or((f64::NAN, f64::NAN));

        let labels = distinct_labels(folds.iter().flat_map(|f| {
            f.classes
                .iter()
                .chain(f.test_y.iter())
                .chain(f.pred_y.iter())
                .copied()
        }));
        let pooled = ConfusionMatrix::new(
            folds.iter().flat_map(|f| f.test_y.iter()),
            folds.iter().flat_map(|f| f.pred_y.iter()),
            labels,
        );

        let (accuracy_mean, accuracy_std) = stat("accuracy");
        let (f1_mean, f1_std) = stat("f1");
        let (precision_mean, precision_std) = stat("precision");
        let (recall_mean, recall_std) = stat("recall");
        let (auc_mean, auc_std) = stat("auc");

        Self {
            accuracy_mean,
            accuracy_std,
            f1_mean,
            f1_std,
            precision_mean,
            precision_std,
            recall_mean,
            recall_std,
            auc_mean,
            auc_std,
            cv: folds,
            confusion: pooled.matrix,
            labels: pooled.labels,
            config,
        }
    }

    /// `(mean, std)` of a summarized metric
    pub fn summary(&self, metric: &str) -> Option<(f64, f64)> {
        match metric {
            "accuracy" => Some((self.accuracy_mean, self.accuracy_std)),
            "f1" => Some((self.f1_mean, self.f1_std)),
            "precision" => Some((self.precision_mean, self.precision_std)),
            "recall" => Some((self.recall_mean, self.recall_std)),
            "auc" => Some((self.auc_mean, self.auc_std)),
            _ => None,
        }
    }

    pub fn n_folds(&self) -> usize {
        self.cv.len()
    }
}

/// Outcome of a multi-dataset invocation
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Dataset name to its summary
    pub results: BTreeMap<String, AggregateResult>,
    /// Dataset name to the error that stopped its run
    pub failures: BTreeMap<String, String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
