//! Recursive feature elimination with cross-validated subset size

use crate::error::{CvError, Result};
use crate::evaluation::accuracy;
use crate::training::{CVStrategy, Classifier, CrossValidator};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cross-validated recursive feature elimination
///
/// Removes one feature per step, lowest weight first, and keeps the subset
/// size with the best mean inner accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSelector {
    /// Inner stratified folds
    pub n_splits: usize,
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self::new(5)
    }
}

/// A fitted selection and the estimator refit on the kept columns
#[derive(Debug, Clone)]
pub struct FeatureSelection<C> {
    support: Vec<bool>,
    ranking: Vec<usize>,
    cv_scores: Vec<f64>,
    estimator: C,
}

impl FeatureSelector {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Pick the subset size by inner cross-validation, then eliminate down
    /// to it on all of `x`
    pub fn fit<C>(&self, estimator: &C, x: &Array2<f64>, y: &Array1<f64>) -> Result<FeatureSelection<C>>
    where
        C: Classifier + Clone,
    {
        let n_features = x.ncols();
        if n_features == 0 {
            return Err(CvError::ShapeError {
                expected: "at least 1 feature".to_string(),
                actual: "0 features".to_string(),
            });
        }

        let splits = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: self.n_splits,
            shuffle: false,
        })
        .split(x.nrows(), Some(y))?;

        // Per fold: scores[k] is the accuracy with n_features - k columns
        let fold_scores: Vec<Vec<f64>> = splits
            .par_iter()
            .map(|split| -> Result<Vec<f64>> {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_val = x.select(Axis(0), &split.test_indices);
                let y_val = y.select(Axis(0), &split.test_indices);

                let mut scores = Vec::new();
                eliminate(estimator, &x_train, &y_train, 1, |model, kept| {
                    let y_hat = model.predict(&x_val.select(Axis(1), kept))?;
                    scores.push(accuracy(&y_val, &y_hat));
                    Ok(())
                })?;
                Ok(scores)
            })
            .collect::<Result<Vec<_>>>()?;

        let n_sizes = n_features;
        let cv_scores: Vec<f64> = (0..n_sizes)
            .map(|k| fold_scores.iter().map(|s| s[k]).sum::<f64>() / fold_scores.len() as f64)
            .collect();

        // Scan from the smallest subset so ties keep fewer features
        let mut best_k = n_sizes - 1;
        for k in (0..n_sizes).rev() {
            if cv_scores[k] > cv_scores[best_k] {
                best_k = k;
            }
        }
        let n_select = n_features - best_k;
        debug!(n_select, n_features, score = cv_scores[best_k], "Chose feature subset size");

        let (ranking, estimator) = eliminate(estimator, x, y, n_select, |_, _| Ok(()))?;
        let support: Vec<bool> = ranking.iter().map(|&r| r == 1).collect();

        Ok(FeatureSelection {
            support,
            ranking,
            // Reported from one feature upwards
            cv_scores: cv_scores.into_iter().rev().collect(),
            estimator,
        })
    }
}

/// Drop the lowest-weight feature until `n_select` remain
///
/// `on_step` sees the model fitted on each visited subset (largest first).
/// Returns the ranking (1 for kept features, higher for earlier removals)
/// and the model fitted on the kept features.
fn eliminate<C, F>(
    estimator: &C,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_select: usize,
    mut on_step: F,
) -> Result<(Vec<usize>, C)>
where
    C: Classifier + Clone,
    F: FnMut(&C, &[usize]) -> Result<()>,
{
    let n_features = x.ncols();
    let mut remaining: Vec<usize> = (0..n_features).collect();
    let mut support = vec![true; n_features];
    let mut ranking = vec![1usize; n_features];

    loop {
        let mut model = estimator.clone();
        model.fit(&x.select(Axis(1), &remaining), y)?;
        on_step(&model, &remaining)?;

        if remaining.len() <= n_select {
            return Ok((ranking, model));
        }

        let weights = model.feature_weights().ok_or_else(|| {
            CvError::FitError("estimator exposes no feature weights for elimination".to_string())
        })?;
        let mut weakest = 0;
        for (i, w) in weights.iter().enumerate() {
            if *w < weights[weakest] {
                weakest = i;
            }
        }

        support[remaining.remove(weakest)] = false;
        for (rank, _) in ranking.iter_mut().zip(&support).filter(|(_, kept)| !**kept) {
            *rank += 1;
        }
    }
}

impl<C: Classifier> FeatureSelection<C> {
    /// Mask over the original columns
    pub fn support(&self) -> &[bool] {
        &self.support
    }

    /// 1 for selected columns; larger means eliminated earlier
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// Mean inner accuracy for subset sizes `1..=n_features`
    pub fn cv_scores(&self) -> &[f64] {
        &self.cv_scores
    }

    /// Number of selected columns
    pub fn n_features(&self) -> usize {
        self.support.iter().filter(|&&s| s).count()
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        (0..self.support.len()).filter(|&i| self.support[i]).collect()
    }

    /// Names of the selected columns
    pub fn selected_names(&self, header: &[String]) -> Vec<String> {
        self.selected_indices()
            .into_iter()
            .filter_map(|i| header.get(i).cloned())
            .collect()
    }

    /// Keep only the selected columns
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.support.len() {
            return Err(CvError::ShapeError {
                expected: format!("{} features", self.support.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.select(Axis(1), &self.selected_indices()))
    }

    /// Estimator fitted on the selected columns
    pub fn estimator(&self) -> &C {
        &self.estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelKind;
    use crate::training::ClassifierModel;
    use ndarray::array;

    /// Column 0 separates the classes, columns 1 and 2 are noise
    fn informative_first() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.3, 0.5],
            [0.1, 0.9, 0.1],
            [0.2, 0.1, 0.7],
            [0.1, 0.5, 0.2],
            [0.3, 0.7, 0.9],
            [0.2, 0.2, 0.4],
            [2.0, 0.4, 0.6],
            [2.1, 0.8, 0.2],
            [1.9, 0.2, 0.8],
            [2.2, 0.6, 0.1],
            [2.0, 0.1, 0.3],
            [2.1, 0.9, 0.5],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_keeps_informative_feature() {
        let (x, y) = informative_first();
        let model = ClassifierModel::new(ModelKind::LogisticRegression);

        let selection = FeatureSelector::new(3).fit(&model, &x, &y).unwrap();

        assert_eq!(selection.support().len(), 3);
        assert!(selection.support()[0]);
        assert_eq!(selection.n_features(), selection.selected_indices().len());
        assert_eq!(selection.cv_scores().len(), 3);
        assert_eq!(selection.ranking()[0], 1);

        let restricted = selection.transform(&x).unwrap();
        assert_eq!(restricted.ncols(), selection.n_features());
        assert_eq!(selection.estimator().predict(&restricted).unwrap().len(), 12);
    }

    #[test]
    fn test_ranking_orders_removals() {
        let (x, y) = informative_first();
        let model = ClassifierModel::new(ModelKind::LinearSvm);

        let selection = FeatureSelector::new(2).fit(&model, &x, &y).unwrap();
        let mut ranks = selection.ranking().to_vec();
        ranks.sort_unstable();
        let n_dropped = 3 - selection.n_features();
        let expected: Vec<usize> = std::iter::repeat(1)
            .take(selection.n_features())
            .chain(2..2 + n_dropped)
            .collect();
        assert_eq!(ranks, expected);
    }

    #[test]
    fn test_selected_names() {
        let (x, y) = informative_first();
        let model = ClassifierModel::new(ModelKind::LogisticRegression);
        let selection = FeatureSelector::new(3).fit(&model, &x, &y).unwrap();

        let header = vec!["signal".to_string(), "noise_a".to_string(), "noise_b".to_string()];
        assert!(selection.selected_names(&header).contains(&"signal".to_string()));
    }

    #[test]
    fn test_rbf_has_no_weights() {
        let (x, y) = informative_first();
        let model = ClassifierModel::new(ModelKind::RbfSvm);
        let err = FeatureSelector::new(3).fit(&model, &x, &y).unwrap_err();
        assert!(matches!(err, CvError::FitError(_)));
    }
}
