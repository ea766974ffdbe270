//! Classification metrics

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fraction of exact label matches
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Counts of (true label, predicted label) pairs over a fixed label order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Row and column labels, ascending
    pub labels: Vec<f64>,
    /// `matrix[i][j]`: samples of `labels[i]` predicted as `labels[j]`
    pub matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Count pairs; labels outside `labels` are ignored
    pub fn new<'a>(
        y_true: impl IntoIterator<Item = &'a f64>,
        y_pred: impl IntoIterator<Item = &'a f64>,
        labels: Vec<f64>,
    ) -> Self {
        let n = labels.len();
        let mut matrix = vec![vec![0usize; n]; n];
        let position = |v: f64| labels.iter().position(|&l| l == v);
        for (&t, &p) in y_true.into_iter().zip(y_pred) {
            if let (Some(i), Some(j)) = (position(t), position(p)) {
                matrix[i][j] += 1;
            }
        }
        Self { labels, matrix }
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Sum of all cells
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn true_positives(&self, idx: usize) -> usize {
        self.matrix[idx][idx]
    }

    /// Row sum: samples whose true label is `labels[idx]`
    pub fn support(&self, idx: usize) -> usize {
        self.matrix[idx].iter().sum()
    }

    /// Column sum: samples predicted as `labels[idx]`
    pub fn predicted(&self, idx: usize) -> usize {
        self.matrix.iter().map(|row| row[idx]).sum()
    }
}

/// Per-class precision, recall and F1 for the given label positions
///
/// A zero denominator yields 0.0.
pub fn precision_recall_f1(cm: &ConfusionMatrix, label_idx: &[usize]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let mut precision = Vec::with_capacity(label_idx.len());
    let mut recall = Vec::with_capacity(label_idx.len());
    let mut f1 = Vec::with_capacity(label_idx.len());
    for &i in label_idx {
        let tp = cm.true_positives(i);
        let p = ratio(tp, cm.predicted(i));
        let r = ratio(tp, cm.support(i));
        precision.push(p);
        recall.push(r);
        f1.push(if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 });
    }
    (precision, recall, f1)
}

/// Receiver operating characteristic for one positive class
///
/// Serialized as `[fpr, tpr, thresholds]` with the leading `+inf`
/// threshold written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing; the first entry is `+inf`
    pub thresholds: Vec<f64>,
}

impl Serialize for RocCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let thresholds: Vec<Option<f64>> = self
            .thresholds
            .iter()
            .map(|t| t.is_finite().then_some(*t))
            .collect();
        (&self.fpr, &self.tpr, thresholds).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RocCurve {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (fpr, tpr, thresholds): (Vec<f64>, Vec<f64>, Vec<Option<f64>>) =
            Deserialize::deserialize(deserializer)?;
        Ok(Self {
            fpr,
            tpr,
            thresholds: thresholds
                .into_iter()
                .map(|t| t.unwrap_or(f64::INFINITY))
                .collect(),
        })
    }
}

/// ROC curve of `scores` against the boolean truth
///
/// Returns `None` when `y_true` holds only one class.
pub fn roc_curve(y_true: &[bool], scores: ArrayView1<f64>) -> Option<RocCurve> {
    let n_pos = y_true.iter().filter(|&&t| t).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let (mut tp, mut fp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        if y_true[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        // Emit a point only after the last sample sharing this score
        let last_of_run = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_run {
            fpr.push(fp as f64 / n_neg as f64);
            tpr.push(tp as f64 / n_pos as f64);
            thresholds.push(scores[i]);
        }
    }

    Some(RocCurve { fpr, tpr, thresholds })
}

/// Area under a ROC curve by the trapezoidal rule
pub fn auc(curve: &RocCurve) -> f64 {
    curve
        .fpr
        .windows(2)
        .zip(curve.tpr.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
        .sum()
}

/// ROC AUC, `None` when undefined
pub fn roc_auc(y_true: &[bool], scores: ArrayView1<f64>) -> Option<f64> {
    roc_curve(y_true, scores).map(|curve| auc(&curve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(accuracy(&y_true, &y_pred), 0.75);
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = [0.0, 0.0, 1.0, 1.0, 2.0];
        let y_pred = [0.0, 1.0, 1.0, 1.0, 0.0];
        let cm = ConfusionMatrix::new(&y_true, &y_pred, vec![0.0, 1.0, 2.0]);

        assert_eq!(cm.matrix, vec![vec![1, 1, 0], vec![0, 2, 0], vec![1, 0, 0]]);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.support(0), 2);
        assert_eq!(cm.predicted(1), 3);
    }

    #[test]
    fn test_precision_recall_differ() {
        let y_true = [1.0, 1.0, 1.0, 0.0];
        let y_pred = [1.0, 0.0, 0.0, 1.0];
        let cm = ConfusionMatrix::new(&y_true, &y_pred, vec![0.0, 1.0]);
        let (p, r, f1) = precision_recall_f1(&cm, &[0, 1]);

        assert_eq!(p, vec![0.0, 0.5]);
        assert!((r[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(r[0], 0.0);
        assert!((f1[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_roc_curve() {
        let y_true = [false, false, true, true];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&y_true, scores.view()).unwrap();

        assert_eq!(curve.thresholds[0], f64::INFINITY);
        assert_eq!(curve.thresholds[1..], [0.8, 0.4, 0.35, 0.1]);
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert!((auc(&curve) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_curve_json_form() {
        let y_true = [false, true, true];
        let scores = array![0.2, 0.9, 0.6];
        let curve = roc_curve(&y_true, scores.view()).unwrap();

        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert!(json[2][0].is_null());
        assert_eq!(json[2][1], 0.9);

        let back: RocCurve = serde_json::from_value(json).unwrap();
        assert_eq!(back, curve);
        assert_eq!(back.thresholds[0], f64::INFINITY);
    }

    #[test]
    fn test_roc_ties_and_perfect_ranking() {
        let y_true = [false, true, true];
        let scores = array![0.2, 0.9, 0.9];
        let curve = roc_curve(&y_true, scores.view()).unwrap();
        assert_eq!(curve.thresholds.len(), 3);
        assert_eq!(auc(&curve), 1.0);
    }

    #[test]
    fn test_auc_undefined_for_single_class() {
        let scores = array![0.2, 0.7];
        assert_eq!(roc_auc(&[true, true], scores.view()), None);
        assert_eq!(roc_auc(&[false, false], scores.view()), None);
    }
}
