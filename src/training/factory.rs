//! Model kind to (untrained model, search grid)

use super::models::ClassifierModel;
use crate::config::ModelKind;
use crate::error::{CvError, Result};
use crate::search::{ParamGrid, ParamValue};

const C_RANGE: (f64, f64) = (0.0001, 10.0);
const GAMMA_RANGE: (f64, f64) = (0.01, 100.0);

/// Builds the classifier and grid for a model kind
pub struct ModelFactory;

impl ModelFactory {
    /// Untrained classifier plus its hyperparameter grid; `trials` sets the
    /// density of the C/gamma ranges
    pub fn build(kind: ModelKind, trials: usize) -> Result<(ClassifierModel, ParamGrid)> {
        if trials == 0 {
            return Err(CvError::ConfigError("trials must be at least 1".to_string()));
        }
        Ok((ClassifierModel::new(kind), Self::grid(kind, trials)))
    }

    /// Same as [`ModelFactory::build`] with the kind given by name
    pub fn build_named(name: &str, trials: usize) -> Result<(ClassifierModel, ParamGrid)> {
        Self::build(name.parse()?, trials)
    }

    fn grid(kind: ModelKind, trials: usize) -> ParamGrid {
        let (c_low, c_high) = C_RANGE;
        match kind {
            ModelKind::RandomForest => ParamGrid::new()
                .add(
                    "n_estimators",
                    vec![ParamValue::Int(10), ParamValue::Int(100), ParamValue::Int(1000)],
                )
                .add("max_features", vec!["auto".into()])
                .add("min_samples_split", vec![ParamValue::Int(2)])
                .add("max_depth", vec![ParamValue::Null]),
            ModelKind::LinearSvm | ModelKind::LogisticRegression => {
                ParamGrid::new().linspace("C", c_low, c_high, trials)
            }
            ModelKind::RbfSvm => ParamGrid::new()
                .linspace("C", c_low, c_high, trials)
                .linspace("gamma", GAMMA_RANGE.0, GAMMA_RANGE.1, trials),
        }
    }
}
