//! Parallel cross-validation driver

use super::fold::{FoldResult, FoldTask};
use super::results::{AggregateResult, RunReport, SUMMARY_METRICS};
use crate::config::CvConfig;
use crate::data::Dataset;
use crate::error::{CvError, Result};
use crate::training::{CVSplit, CVStrategy, CrossValidator};
use rayon::prelude::*;
use tracing::{error, info};

/// Runs the fold pipeline for every outer fold and summarizes the results
#[derive(Debug, Clone)]
pub struct CrossValidationOrchestrator {
    config: CvConfig,
}

impl CrossValidationOrchestrator {
    /// Create an orchestrator; fails on an invalid configuration
    pub fn new(config: CvConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CvConfig {
        &self.config
    }

    /// Shuffled K-fold partition of the dataset, fixed by the configured seed
    pub fn splits(&self, dataset: &Dataset) -> Result<Vec<CVSplit>> {
        CrossValidator::new(CVStrategy::KFold {
            n_splits: self.config.n_splits,
            shuffle: true,
        })
        .with_random_state(self.config.random_seed)
        .split(dataset.n_samples(), None)
    }

    /// Cross-validate one dataset; the first failing fold aborts the run
    pub fn run(&self, dataset: &Dataset) -> Result<AggregateResult> {
        let splits = self.splits(dataset)?;
        info!(
            model = %self.config.model,
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            n_splits = splits.len(),
            "Starting cross-validation"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pool_size())
            .build()
            .map_err(|e| CvError::ThreadPoolError(e.to_string()))?;

        let folds: Vec<FoldResult> = pool.install(|| {
            splits
                .par_iter()
                .map(|split| FoldTask::new(split, dataset, &self.config).run())
                .collect::<Result<Vec<_>>>()
        })?;

        let result = AggregateResult::from_folds(folds, self.config.clone());
        for metric in SUMMARY_METRICS {
            if let Some((mean, std)) = result.summary(metric) {
                info!(metric, mean, std, "Cross-validated metric");
            }
        }
        Ok(result)
    }

    /// Cross-validate each dataset independently; one failure does not
    /// stop the others
    pub fn run_many(&self, datasets: &[(String, Dataset)]) -> RunReport {
        let mut report = RunReport::default();
        for (name, dataset) in datasets {
            info!(dataset = %name, "Processing dataset");
            match self.run(dataset) {
                Ok(result) => {
                    report.results.insert(name.clone(), result);
                }
                Err(e) => {
                    error!(dataset = %name, error = %e, "Cross-validation failed");
                    report.failures.insert(name.clone(), e.to_string());
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelKind;
    use ndarray::{Array1, Array2};

    fn two_blobs(n_per_class: usize) -> Dataset {
        let n = 2 * n_per_class;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let offset = if i < n_per_class { 0.0 } else { 3.0 };
            offset + ((i * 7 + j * 3) % 5) as f64 * 0.1
        });
        let y = Array1::from_shape_fn(n, |i| if i < n_per_class { 0.0 } else { 1.0 });
        Dataset::new(x, y, None).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CvConfig::default().with_n_splits(1);
        assert!(matches!(
            CrossValidationOrchestrator::new(config),
            Err(CvError::ConfigError(_))
        ));
    }

    #[test]
    fn test_run_partitions_dataset() {
        let ds = two_blobs(10);
        let config = CvConfig::new(ModelKind::LogisticRegression).with_n_splits(4);
        let result = CrossValidationOrchestrator::new(config).unwrap().run(&ds).unwrap();

        assert_eq!(result.n_folds(), 4);
        let mut seen: Vec<f64> = Vec::new();
        for (i, fold) in result.cv.iter().enumerate() {
            assert_eq!(fold.fold, i);
            seen.extend(&fold.test_y);
        }
        assert_eq!(seen.len(), 20);
        let total: usize = result.confusion.iter().flatten().sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_too_few_samples_is_shape_error() {
        let ds = two_blobs(2);
        let config = CvConfig::default().with_n_splits(5);
        let err = CrossValidationOrchestrator::new(config).unwrap().run(&ds).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_run_many_isolates_failures() {
        let config = CvConfig::new(ModelKind::LogisticRegression).with_n_splits(3);
        let orchestrator = CrossValidationOrchestrator::new(config).unwrap();
        let datasets = vec![
            ("good".to_string(), two_blobs(6)),
            ("tiny".to_string(), two_blobs(1)),
        ];

        let report = orchestrator.run_many(&datasets);
        assert!(report.results.contains_key("good"));
        assert!(report.failures.contains_key("tiny"));
        assert!(!report.is_success());
    }
}
