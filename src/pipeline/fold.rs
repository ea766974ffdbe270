//! One fold of the cross-validation run

use crate::config::CvConfig;
use crate::data::Dataset;
use crate::error::Result;
use crate::evaluation::{Evaluator, Metrics};
use crate::search::{GridSearch, ParamSet};
use crate::selection::FeatureSelector;
use crate::training::{CVSplit, Classifier, ClassifierModel, ModelFactory};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything a worker needs to run one fold
#[derive(Debug, Clone, Copy)]
pub struct FoldTask<'a> {
    pub split: &'a CVSplit,
    pub dataset: &'a Dataset,
    pub config: &'a CvConfig,
}

/// Outcome of one fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// Position of the fold in the outer split
    pub fold: usize,
    pub test_y: Vec<f64>,
    pub pred_y: Vec<f64>,
    /// One row per test sample, one column per entry of `classes`
    pub prob_y: Vec<Vec<f64>>,
    /// Sorted distinct labels of the training part
    pub classes: Vec<f64>,
    /// Mask over the original columns when feature selection ran
    pub selected_feature: Option<Vec<bool>>,
    /// Winning grid point when the grid search ran
    pub param: Option<ParamSet>,
    /// Mean inner accuracy of `param`
    pub best_score: Option<f64>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Test-set predictions of whichever stage fitted the final model
struct Predictions {
    labels: Array1<f64>,
    proba: Array2<f64>,
    classes: Vec<f64>,
}

impl Predictions {
    fn from_model(model: &ClassifierModel, x_test: &Array2<f64>) -> Result<Self> {
        Ok(Self {
            labels: model.predict(x_test)?,
            proba: model.predict_proba(x_test)?,
            classes: model.classes().to_vec(),
        })
    }
}

impl<'a> FoldTask<'a> {
    pub fn new(split: &'a CVSplit, dataset: &'a Dataset, config: &'a CvConfig) -> Self {
        Self {
            split,
            dataset,
            config,
        }
    }

    /// Feature selection, then grid search or a direct fit, then evaluation
    pub fn run(&self) -> Result<FoldResult> {
        let fold = self.split.fold_idx;
        let (mut x_train, y_train) = self.dataset.subset(&self.split.train_indices);
        let (mut x_test, y_test) = self.dataset.subset(&self.split.test_indices);

        let (model, grid) = ModelFactory::build(self.config.model, self.config.trials)?;
        let model = model.with_random_state(self.config.random_seed);

        let mut predictions = None;
        let mut selected_feature = None;
        let mut param = None;
        let mut best_score = None;

        if self.config.feature_selection {
            let selection =
                FeatureSelector::new(self.config.rfe_cv_splits).fit(&model, &x_train, &y_train)?;
            x_train = selection.transform(&x_train)?;
            x_test = selection.transform(&x_test)?;

            match self.dataset.header() {
                Some(header) => {
                    info!(fold, features = ?selection.selected_names(header), "Selected features")
                }
                None => {
                    info!(fold, features = ?selection.selected_indices(), "Selected features")
                }
            }

            predictions = Some(Predictions::from_model(selection.estimator(), &x_test)?);
            selected_feature = Some(selection.support().to_vec());
        }

        if self.config.grid_search {
            let search = GridSearch::new(grid, self.config.param_search_splits)
                .fit(&model, &x_train, &y_train)?;
            info!(fold, params = %search.best_params, best_score = search.best_score, "Best parameters");

            predictions = Some(Predictions::from_model(&search.best_estimator, &x_test)?);
            param = Some(search.best_params);
            best_score = Some(search.best_score);
        }

        let predictions = match predictions {
            Some(p) => p,
            None => {
                let mut model = model;
                model.fit(&x_train, &y_train)?;
                Predictions::from_model(&model, &x_test)?
            }
        };

        let metrics = Evaluator::new().evaluate(
            &y_test,
            &predictions.labels,
            &predictions.proba,
            &predictions.classes,
        )?;
        info!(fold, accuracy = metrics.accuracy, "Fold finished");
        debug!(fold, auc = ?metrics.auc, "Fold AUC");

        Ok(FoldResult {
            fold,
            test_y: y_test.to_vec(),
            pred_y: predictions.labels.to_vec(),
            prob_y: predictions
                .proba
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            classes: predictions.classes,
            selected_feature,
            param,
            best_score,
            metrics,
        })
    }
}
