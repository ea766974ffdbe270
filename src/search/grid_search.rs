//! Exhaustive grid search with inner cross-validation

use super::params::{ParamGrid, ParamSet};
use crate::error::Result;
use crate::evaluation::accuracy;
use crate::pipeline::mean_std;
use crate::training::{CVStrategy, Classifier, CrossValidator};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Inner cross-validation outcome of one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub mean_score: f64,
    pub std_score: f64,
    pub fold_scores: Vec<f64>,
}

/// Outcome of a search: the winning point and the estimator refit with it
#[derive(Debug, Clone)]
pub struct GridSearchResult<C> {
    pub best_params: ParamSet,
    pub best_score: f64,
    pub cv_results: Vec<CandidateResult>,
    /// Fitted on all rows passed to [`GridSearch::fit`]
    pub best_estimator: C,
}

/// Grid search scored by mean inner accuracy
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    n_splits: usize,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, n_splits: usize) -> Self {
        Self { grid, n_splits }
    }

    /// Score every grid point with stratified inner folds, pick the highest
    /// mean (first point wins ties), then refit it on all of `x`
    pub fn fit<C>(&self, estimator: &C, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchResult<C>>
    where
        C: Classifier + Clone,
    {
        self.grid.validate()?;
        let splits = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: self.n_splits,
            shuffle: false,
        })
        .split(x.nrows(), Some(y))?;

        let candidates = self.grid.candidates();
        debug!(
            n_candidates = candidates.len(),
            n_splits = self.n_splits,
            "Starting grid search"
        );

        let cv_results: Vec<CandidateResult> = candidates
            .into_par_iter()
            .map(|params| -> Result<CandidateResult> {
                let fold_scores = splits
                    .iter()
                    .map(|split| -> Result<f64> {
                        let mut model = estimator.clone();
                        model.set_params(&params)?;
                        model.fit(
                            &x.select(Axis(0), &split.train_indices),
                            &y.select(Axis(0), &split.train_indices),
                        )?;
                        let y_val = y.select(Axis(0), &split.test_indices);
                        let y_hat = model.predict(&x.select(Axis(0), &split.test_indices))?;
                        Ok(accuracy(&y_val, &y_hat))
                    })
                    .collect::<Result<Vec<f64>>>()?;

                let (mean_score, std_score) = mean_std(&fold_scores);
                debug!(params = %params, mean_score, std_score, "Scored candidate");
                Ok(CandidateResult {
                    params,
                    mean_score,
                    std_score,
                    fold_scores,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best_idx = 0;
        for (idx, candidate) in cv_results.iter().enumerate() {
            if candidate.mean_score > cv_results[best_idx].mean_score {
                best_idx = idx;
            }
        }
        let best_params = cv_results[best_idx].params.clone();
        let best_score = cv_results[best_idx].mean_score;

        let mut best_estimator = estimator.clone();
        best_estimator.set_params(&best_params)?;
        best_estimator.fit(x, y)?;

        info!(best_params = %best_params, best_score, "Grid search finished");

        Ok(GridSearchResult {
            best_params,
            best_score,
            cv_results,
            best_estimator,
        })
    }
}
