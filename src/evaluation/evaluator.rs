//! Per-fold evaluation

use super::metrics::{accuracy, precision_recall_f1, roc_auc, roc_curve, ConfusionMatrix, RocCurve};
use crate::data::distinct_labels;
use crate::error::{CvError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A metric reported once, or once per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByClass<T> {
    Single(T),
    PerClass(Vec<T>),
}

impl<T> ByClass<T> {
    pub fn values(&self) -> Vec<&T> {
        match self {
            ByClass::Single(v) => vec![v],
            ByClass::PerClass(vs) => vs.iter().collect(),
        }
    }

    pub fn as_single(&self) -> Option<&T> {
        match self {
            ByClass::Single(v) => Some(v),
            ByClass::PerClass(_) => None,
        }
    }
}

/// Metrics of one fold's test predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    /// Per class for binary problems, macro average otherwise
    pub precision: ByClass<f64>,
    pub recall: ByClass<f64>,
    pub f1: ByClass<f64>,
    /// Positive-class AUC for binary problems, one-vs-rest per column otherwise;
    /// `None` where the test labels hold a single class
    pub auc: ByClass<Option<f64>>,
    #[serde(rename = "roc_curve")]
    pub roc: ByClass<Option<RocCurve>>,
    pub confusion: ConfusionMatrix,
}

/// Computes [`Metrics`] from test labels, predictions and probabilities
#[derive(Debug, Clone, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one fold
    ///
    /// `classes` gives the label of each probability column. Two columns take
    /// the binary path, more take the multiclass path.
    pub fn evaluate(
        &self,
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        proba: &Array2<f64>,
        classes: &[f64],
    ) -> Result<Metrics> {
        if y_pred.len() != y_true.len() || proba.nrows() != y_true.len() {
            return Err(CvError::ShapeError {
                expected: format!("{} predictions and probability rows", y_true.len()),
                actual: format!("{} predictions, {} probability rows", y_pred.len(), proba.nrows()),
            });
        }
        if proba.ncols() != classes.len() || classes.len() < 2 {
            return Err(CvError::ShapeError {
                expected: format!("one probability column per class, at least 2 ({} classes)", classes.len()),
                actual: format!("{} columns", proba.ncols()),
            });
        }

        let labels = distinct_labels(
            classes
                .iter()
                .chain(y_true.iter())
                .chain(y_pred.iter())
                .copied(),
        );
        let confusion = ConfusionMatrix::new(y_true, y_pred, labels);

        // Precision/recall/F1 only over labels that occur in the fold
        let present = distinct_labels(y_true.iter().chain(y_pred.iter()).copied());
        let present_idx: Vec<usize> = confusion
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| present.contains(*l))
            .map(|(i, _)| i)
            .collect();
        let (precision, recall, f1) = precision_recall_f1(&confusion, &present_idx);

        let metrics = if classes.len() == 2 {
            let pos = classes.iter().position(|&c| c == 1.0).unwrap_or(1);
            let truth: Vec<bool> = y_true.iter().map(|&v| v == classes[pos]).collect();
            let scores = proba.column(pos);

            Metrics {
                accuracy: accuracy(y_true, y_pred),
                precision: ByClass::PerClass(precision),
                recall: ByClass::PerClass(recall),
                f1: ByClass::PerClass(f1),
                auc: ByClass::Single(roc_auc(&truth, scores)),
                roc: ByClass::Single(roc_curve(&truth, scores)),
                confusion,
            }
        } else {
            let mut aucs = Vec::with_capacity(classes.len());
            let mut rocs = Vec::with_capacity(classes.len());
            for (col, &label) in classes.iter().enumerate() {
                let truth: Vec<bool> = y_true.iter().map(|&v| v == label).collect();
                aucs.push(roc_auc(&truth, proba.column(col)));
                rocs.push(roc_curve(&truth, proba.column(col)));
            }

            Metrics {
                accuracy: accuracy(y_true, y_pred),
                precision: ByClass::Single(macro_average(&precision)),
                recall: ByClass::Single(macro_average(&recall)),
                f1: ByClass::Single(macro_average(&f1)),
                auc: ByClass::PerClass(aucs),
                roc: ByClass::PerClass(rocs),
                confusion,
            }
        };

        Ok(metrics)
    }
}

fn macro_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_branch() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0];
        let proba = array![[0.9, 0.1], [0.4, 0.6], [0.3, 0.7], [0.2, 0.8]];

        let m = Evaluator::new().evaluate(&y_true, &y_pred, &proba, &[0.0, 1.0]).unwrap();

        assert_eq!(m.accuracy, 0.75);
        assert_eq!(m.auc, ByClass::Single(Some(1.0)));
        assert_eq!(m.confusion.matrix, vec![vec![1, 1], vec![0, 2]]);
        assert_eq!(m.precision, ByClass::PerClass(vec![1.0, 2.0 / 3.0]));
        assert_eq!(m.recall, ByClass::PerClass(vec![0.5, 1.0]));
    }

    #[test]
    fn test_binary_positive_column_without_label_one() {
        let y_true = array![2.0, 5.0, 5.0];
        let y_pred = array![2.0, 5.0, 2.0];
        let proba = array![[0.8, 0.2], [0.1, 0.9], [0.6, 0.4]];

        let m = Evaluator::new().evaluate(&y_true, &y_pred, &proba, &[2.0, 5.0]).unwrap();
        assert_eq!(m.auc, ByClass::Single(Some(1.0)));
    }

    #[test]
    fn test_single_class_fold_has_undefined_auc() {
        let y_true = array![1.0, 1.0, 1.0];
        let y_pred = array![1.0, 0.0, 1.0];
        let proba = array![[0.2, 0.8], [0.6, 0.4], [0.1, 0.9]];

        let m = Evaluator::new().evaluate(&y_true, &y_pred, &proba, &[0.0, 1.0]).unwrap();
        assert_eq!(m.auc, ByClass::Single(None));
        assert_eq!(m.confusion.n_labels(), 2);
        assert_eq!(m.confusion.total(), 3);
    }

    #[test]
    fn test_multiclass_branch() {
        let y_true = array![0.0, 1.0, 2.0, 2.0];
        let y_pred = array![0.0, 2.0, 2.0, 2.0];
        let proba = array![
            [0.7, 0.2, 0.1],
            [0.1, 0.3, 0.6],
            [0.1, 0.1, 0.8],
            [0.2, 0.2, 0.6],
        ];

        let m = Evaluator::new()
            .evaluate(&y_true, &y_pred, &proba, &[0.0, 1.0, 2.0])
            .unwrap();

        assert_eq!(m.confusion.n_labels(), 3);
        match &m.auc {
            ByClass::PerClass(aucs) => {
                assert_eq!(aucs.len(), 3);
                assert_eq!(aucs[0], Some(1.0));
            }
            other => panic!("expected per-class AUC, got {:?}", other),
        }
        // macro recall: (1 + 0 + 1) / 3
        let recall = *m.recall.as_single().unwrap();
        assert!((recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let y = array![0.0, 1.0];
        let proba = array![[0.5, 0.5]];
        let err = Evaluator::new().evaluate(&y, &y, &proba, &[0.0, 1.0]).unwrap_err();
        assert!(err.is_shape_error());
    }
}
