//! Run configuration

use crate::error::{CvError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Classifier family evaluated by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    RandomForest,
    LinearSvm,
    RbfSvm,
    LogisticRegression,
}

impl ModelKind {
    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random-forest",
            ModelKind::LinearSvm => "linear-svm",
            ModelKind::RbfSvm => "rbf-svm",
            ModelKind::LogisticRegression => "logistic-regression",
        }
    }

    /// All recognized kinds
    pub fn all() -> [ModelKind; 4] {
        [
            ModelKind::RandomForest,
            ModelKind::LinearSvm,
            ModelKind::RbfSvm,
            ModelKind::LogisticRegression,
        ]
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = CvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "random-forest" | "random_forest" | "rf" => Ok(ModelKind::RandomForest),
            "linear-svm" | "linear_svm" | "svm" => Ok(ModelKind::LinearSvm),
            "rbf-svm" | "rbf_svm" => Ok(ModelKind::RbfSvm),
            "logistic-regression" | "logistic_regression" | "lr" => {
                Ok(ModelKind::LogisticRegression)
            }
            other => Err(CvError::ConfigError(format!("unknown model kind: {}", other))),
        }
    }
}

/// Configuration for a cross-validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Classifier family
    pub model: ModelKind,
    /// Run recursive feature elimination inside each fold
    pub feature_selection: bool,
    /// Run the nested hyperparameter search inside each fold
    pub grid_search: bool,
    /// Grid density for the SVM / logistic regression grids
    pub trials: usize,
    /// Outer fold count (K)
    pub n_splits: usize,
    /// Inner fold count for the grid search (P)
    pub param_search_splits: usize,
    /// Inner fold count for recursive feature elimination
    pub rfe_cv_splits: usize,
    /// Seed for fold shuffling and randomized model internals
    pub random_seed: u64,
    /// Worker pool size (None = one worker per fold)
    pub n_jobs: Option<usize>,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::RandomForest,
            feature_selection: false,
            grid_search: false,
            trials: 3,
            n_splits: 5,
            param_search_splits: 3,
            rfe_cv_splits: 5,
            random_seed: 20,
            n_jobs: None,
        }
    }
}

impl CvConfig {
    /// Create a configuration for the given model kind
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub fn with_feature_selection(mut self, enabled: bool) -> Self {
        self.feature_selection = enabled;
        self
    }

    pub fn with_grid_search(mut self, enabled: bool) -> Self {
        self.grid_search = enabled;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    pub fn with_param_search_splits(mut self, n_splits: usize) -> Self {
        self.param_search_splits = n_splits;
        self
    }

    pub fn with_rfe_cv_splits(mut self, n_splits: usize) -> Self {
        self.rfe_cv_splits = n_splits;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Worker pool size for the outer fan-out
    pub fn pool_size(&self) -> usize {
        self.n_jobs.unwrap_or(self.n_splits).max(1)
    }

    /// Check the numeric options
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("n_splits", self.n_splits, 2),
            ("param_search_splits", self.param_search_splits, 2),
            ("rfe_cv_splits", self.rfe_cv_splits, 2),
            ("trials", self.trials, 1),
        ];
        for (name, value, min) in checks {
            if value < min {
                return Err(CvError::ConfigError(format!(
                    "{} must be at least {}, got {}",
                    name, min, value
                )));
            }
        }
        if self.n_jobs == Some(0) {
            return Err(CvError::ConfigError("n_jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CvConfig::default();
        assert_eq!(config.model, ModelKind::RandomForest);
        assert_eq!(config.n_splits, 5);
        assert_eq!(config.param_search_splits, 3);
        assert_eq!(config.trials, 3);
        assert_eq!(config.pool_size(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CvConfig::new(ModelKind::LogisticRegression)
            .with_grid_search(true)
            .with_trials(4)
            .with_n_splits(3)
            .with_n_jobs(2);

        assert!(config.grid_search);
        assert!(!config.feature_selection);
        assert_eq!(config.trials, 4);
        assert_eq!(config.pool_size(), 2);
    }

    #[test]
    fn test_validate_rejects_single_fold() {
        let config = CvConfig::default().with_n_splits(1);
        assert!(matches!(config.validate(), Err(CvError::ConfigError(_))));

        let config = CvConfig::default().with_trials(0);
        assert!(matches!(config.validate(), Err(CvError::ConfigError(_))));
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("rf".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("svm".parse::<ModelKind>().unwrap(), ModelKind::LinearSvm);
        assert_eq!("rbf_svm".parse::<ModelKind>().unwrap(), ModelKind::RbfSvm);
        assert_eq!("logistic-regression".parse::<ModelKind>().unwrap(), ModelKind::LogisticRegression);
        assert!(matches!("knn".parse::<ModelKind>(), Err(CvError::ConfigError(_))));
    }

    #[test]
    fn test_partial_json() {
        let config: CvConfig = serde_json::from_str(r#"{"model": "rbf-svm", "n_splits": 4}"#).unwrap();
        assert_eq!(config.model, ModelKind::RbfSvm);
        assert_eq!(config.n_splits, 4);
        assert_eq!(config.random_seed, 20);
    }
}
