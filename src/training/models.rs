//! Classifier capability and the closed set of model variants

use super::logistic::LogisticRegression;
use super::random_forest::{MaxFeatures, RandomForest};
use super::svm::{KernelType, SVMClassifier, SVMConfig};
use crate::config::ModelKind;
use crate::error::{CvError, Result};
use crate::search::{ParamSet, ParamValue};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Trait for classifiers driven by the cross-validation pipeline
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Class probabilities, one column per entry of [`Classifier::classes`]
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Sorted distinct labels seen during fit
    fn classes(&self) -> &[f64];

    /// Per-feature importance used for recursive elimination
    fn feature_weights(&self) -> Option<Array1<f64>> {
        None
    }

    /// Apply one grid point
    fn set_params(&mut self, params: &ParamSet) -> Result<()>;
}

/// The model variants a [`ModelKind`] can select
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifierModel {
    RandomForest(RandomForest),
    LinearSvm(SVMClassifier),
    RbfSvm(SVMClassifier),
    LogisticRegression(LogisticRegression),
}

impl ClassifierModel {
    /// Untrained model with default hyperparameters
    pub fn new(kind: ModelKind) -> Self {
        match kind {
            ModelKind::RandomForest => ClassifierModel::RandomForest(RandomForest::new(100)),
            ModelKind::LinearSvm => ClassifierModel::LinearSvm(SVMClassifier::new(SVMConfig::linear())),
            ModelKind::RbfSvm => ClassifierModel::RbfSvm(SVMClassifier::new(SVMConfig::rbf())),
            ModelKind::LogisticRegression => {
                ClassifierModel::LogisticRegression(LogisticRegression::new())
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ClassifierModel::RandomForest(_) => ModelKind::RandomForest,
            ClassifierModel::LinearSvm(_) => ModelKind::LinearSvm,
            ClassifierModel::RbfSvm(_) => ModelKind::RbfSvm,
            ClassifierModel::LogisticRegression(_) => ModelKind::LogisticRegression,
        }
    }

    /// Seed the model's internal randomness; deterministic models ignore it
    pub fn with_random_state(mut self, seed: u64) -> Self {
        match &mut self {
            ClassifierModel::RandomForest(rf) => rf.random_state = seed,
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => {
                svm.config_mut().random_state = seed
            }
            ClassifierModel::LogisticRegression(_) => {}
        }
        self
    }
}

fn unknown_param(kind: ModelKind, name: &str) -> CvError {
    CvError::ConfigError(format!("unknown parameter '{}' for {}", name, kind))
}

fn expect_float(name: &str, value: &ParamValue) -> Result<f64> {
    value.as_float().ok_or_else(|| CvError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: "expected a number".to_string(),
    })
}

fn expect_count(name: &str, value: &ParamValue) -> Result<usize> {
    match value.as_int() {
        Some(v) if v > 0 => Ok(v as usize),
        _ => Err(CvError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}

fn parse_max_features(value: &ParamValue) -> Result<MaxFeatures> {
    match value {
        ParamValue::Null => Ok(MaxFeatures::All),
        ParamValue::String(s) => match s.as_str() {
            "auto" | "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            _ => Err(CvError::InvalidParameter {
                name: "max_features".to_string(),
                value: value.to_string(),
                reason: "expected auto, sqrt or log2".to_string(),
            }),
        },
        ParamValue::Float(f) if *f > 0.0 && *f <= 1.0 => Ok(MaxFeatures::Fraction(*f)),
        ParamValue::Int(n) if *n > 0 => Ok(MaxFeatures::Fixed(*n as usize)),
        _ => Err(CvError::InvalidParameter {
            name: "max_features".to_string(),
            value: value.to_string(),
            reason: "unsupported value".to_string(),
        }),
    }
}

impl Classifier for ClassifierModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            ClassifierModel::RandomForest(rf) => rf.fit(x, y).map(|_| ()),
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => svm.fit(x, y),
            ClassifierModel::LogisticRegression(lr) => lr.fit(x, y).map(|_| ()),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            ClassifierModel::RandomForest(rf) => rf.predict(x),
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => svm.predict(x),
            ClassifierModel::LogisticRegression(lr) => lr.predict(x),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            ClassifierModel::RandomForest(rf) => rf.predict_proba(x),
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => svm.predict_proba(x),
            ClassifierModel::LogisticRegression(lr) => lr.predict_proba(x),
        }
    }

    fn classes(&self) -> &[f64] {
        match self {
            ClassifierModel::RandomForest(rf) => rf.classes(),
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => svm.classes(),
            ClassifierModel::LogisticRegression(lr) => lr.classes(),
        }
    }

    fn feature_weights(&self) -> Option<Array1<f64>> {
        match self {
            ClassifierModel::RandomForest(rf) => rf.feature_importances().cloned(),
            ClassifierModel::LinearSvm(svm) | ClassifierModel::RbfSvm(svm) => svm.feature_weights(),
            ClassifierModel::LogisticRegression(lr) => lr.feature_weights(),
        }
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        let kind = self.kind();
        for (name, value) in params.iter() {
            match self {
                ClassifierModel::RandomForest(rf) => match name {
                    "n_estimators" => rf.n_estimators = expect_count(name, value)?,
                    "max_features" => rf.max_features = parse_max_features(value)?,
                    "min_samples_split" => rf.min_samples_split = expect_count(name, value)?,
                    "max_depth" => {
                        rf.max_depth = if value.is_null() {
                            None
                        } else {
                            Some(expect_count(name, value)?)
                        }
                    }
                    _ => return Err(unknown_param(kind, name)),
                },
                ClassifierModel::LinearSvm(svm) => match name {
                    "C" => svm.config_mut().c = expect_float(name, value)?,
                    _ => return Err(unknown_param(kind, name)),
                },
                ClassifierModel::RbfSvm(svm) => match name {
                    "C" => svm.config_mut().c = expect_float(name, value)?,
                    "gamma" => {
                        svm.config_mut().kernel = KernelType::RBF {
                            gamma: Some(expect_float(name, value)?),
                        }
                    }
                    _ => return Err(unknown_param(kind, name)),
                },
                ClassifierModel::LogisticRegression(lr) => match name {
                    "C" => lr.c = expect_float(name, value)?,
                    _ => return Err(unknown_param(kind, name)),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.2],
            [0.3, 0.1],
            [0.1, 0.4],
            [0.2, 0.0],
            [2.0, 2.1],
            [2.2, 1.9],
            [1.9, 2.3],
            [2.1, 2.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_every_variant_fits_and_predicts() {
        let (x, y) = blobs();
        for kind in ModelKind::all() {
            let mut model = ClassifierModel::new(kind).with_random_state(3);
            model.fit(&x, &y).unwrap();
            assert_eq!(model.classes(), &[0.0, 1.0], "{}", kind);
            assert_eq!(model.predict(&x).unwrap().len(), 8);
            assert_eq!(model.predict_proba(&x).unwrap().dim(), (8, 2));
        }
    }

    #[test]
    fn test_feature_weights_by_kind() {
        let (x, y) = blobs();
        let mut rbf = ClassifierModel::new(ModelKind::RbfSvm);
        rbf.fit(&x, &y).unwrap();
        assert!(rbf.feature_weights().is_none());

        let mut lr = ClassifierModel::new(ModelKind::LogisticRegression);
        lr.fit(&x, &y).unwrap();
        assert_eq!(lr.feature_weights().unwrap().len(), 2);
    }

    #[test]
    fn test_set_params() {
        let mut rf = ClassifierModel::new(ModelKind::RandomForest);
        let params = ParamSet::new()
            .with("n_estimators", 10i64)
            .with("max_features", "auto")
            .with("max_depth", ParamValue::Null);
        rf.set_params(&params).unwrap();
        match &rf {
            ClassifierModel::RandomForest(inner) => {
                assert_eq!(inner.n_estimators, 10);
                assert_eq!(inner.max_features, MaxFeatures::Sqrt);
                assert_eq!(inner.max_depth, None);
            }
            other => panic!("unexpected variant {:?}", other.kind()),
        }

        let mut svm = ClassifierModel::new(ModelKind::RbfSvm);
        svm.set_params(&ParamSet::new().with("C", 2.5).with("gamma", 0.5)).unwrap();
        if let ClassifierModel::RbfSvm(inner) = &svm {
            assert_eq!(inner.config().c, 2.5);
            assert_eq!(inner.config().kernel, KernelType::RBF { gamma: Some(0.5) });
        }
    }

    #[test]
    fn test_unknown_param_is_config_error() {
        let mut lr = ClassifierModel::new(ModelKind::LogisticRegression);
        let err = lr.set_params(&ParamSet::new().with("gamma", 1.0)).unwrap_err();
        assert!(matches!(err, CvError::ConfigError(_)));
    }

    #[test]
    fn test_single_class_is_fit_error() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![1.0, 1.0, 1.0];
        for kind in ModelKind::all() {
            let mut model = ClassifierModel::new(kind);
            assert!(matches!(model.fit(&x, &y), Err(CvError::FitError(_))));
        }
    }
}
