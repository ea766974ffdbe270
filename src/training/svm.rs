//! Support Vector Machine classifier
//!
//! Binary problems are solved directly with SMO (Sequential Minimal
//! Optimization); more classes use One-vs-Rest.

use crate::data::distinct_labels;
use crate::error::{CvError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial Basis Function: K(x, y) = exp(-γ * ||x - y||²); `None` = 1 / n_features
    RBF { gamma: Option<f64> },
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of passes over the data
    pub max_iter: usize,
    /// Random seed
    pub random_state: u64,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::RBF { gamma: None },
            tol: 1e-3,
            max_iter: 1000,
            random_state: 42,
        }
    }
}

impl SVMConfig {
    pub fn linear() -> Self {
        Self {
            kernel: KernelType::Linear,
            ..Default::default()
        }
    }

    pub fn rbf() -> Self {
        Self::default()
    }
}

/// One binary machine: `+1` for the target class, `-1` otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    /// alpha_i * y_i per support vector
    dual_coef: Array1<f64>,
    bias: f64,
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    /// Gamma resolved at fit time
    gamma: f64,
    classes: Vec<f64>,
    /// One machine for two classes (positive = classes[1]), else one per class
    machines: Vec<BinarySVM>,
    n_features: usize,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            gamma: 1.0,
            classes: Vec::new(),
            machines: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SVMConfig {
        &mut self.config
    }

    /// Fit the classifier (supports binary and multi-class via One-vs-Rest)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(CvError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.config.c.is_nan() || self.config.c <= 0.0 {
            return Err(CvError::InvalidParameter {
                name: "C".to_string(),
                value: self.config.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(CvError::FitError(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix. \
                 Consider subsampling or using a different algorithm.",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let classes = distinct_labels(y.iter().copied());
        if classes.len() < 2 {
            return Err(CvError::FitError(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.gamma = match self.config.kernel {
            KernelType::RBF { gamma: Some(g) } => g,
            _ => 1.0 / x.ncols().max(1) as f64,
        };
        self.classes = classes;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let targets: Vec<f64> = if self.classes.len() == 2 {
            vec![self.classes[1]]
        } else {
            self.classes.clone()
        };

        self.machines = targets
            .iter()
            .enumerate()
            .map(|(k, &cls)| {
                let y_binary: Array1<f64> =
                    y.mapv(|v| if (v - cls).abs() < 1e-9 { 1.0 } else { -1.0 });
                let seed = self.config.random_state.wrapping_add(k as u64);
                let (alphas, bias) = self.smo_train(&kernel_matrix, &y_binary, seed);

                let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
                let support_vectors = x.select(ndarray::Axis(0), &support);
                let dual_coef = support.iter().map(|&i| alphas[i] * y_binary[i]).collect();

                BinarySVM {
                    support_vectors,
                    dual_coef,
                    bias,
                }
            })
            .collect();

        Ok(())
    }

    /// SMO training algorithm
    fn smo_train(&self, k: &Array2<f64>, y: &Array1<f64>, seed: u64) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;
        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;
        // f(x_i) - b, kept up to date incrementally
        let mut f_cache: Array1<f64> = Array1::zeros(n);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter && n > 1 {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = f_cache[i] + bias - y[i];

                // KKT violation
                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = f_cache[j] + bias - y[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alpha_j_old - alpha_i_old).max(0.0), (c + alpha_j_old - alpha_i_old).min(c))
                    } else {
                        ((alpha_i_old + alpha_j_old - c).max(0.0), (alpha_i_old + alpha_j_old).min(c))
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    let alpha_j = (alpha_j_old - y[j] * (e_i - e_j) / eta).clamp(l, h);
                    if (alpha_j - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }
                    let alpha_i = alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j);

                    let di = y[i] * (alpha_i - alpha_i_old);
                    let dj = y[j] * (alpha_j - alpha_j_old);

                    let b1 = bias - e_i - di * k[[i, i]] - dj * k[[i, j]];
                    let b2 = bias - e_j - di * k[[i, j]] - dj * k[[j, j]];
                    bias = if alpha_i > 0.0 && alpha_i < c {
                        b1
                    } else if alpha_j > 0.0 && alpha_j < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    alphas[i] = alpha_i;
                    alphas[j] = alpha_j;
                    for m in 0..n {
                        f_cache[m] += di * k[[i, m]] + dj * k[[j, m]];
                    }

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        (alphas, bias)
    }

    /// Compute kernel matrix (parallelized over rows)
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| (0..n).map(|j| self.kernel(x.row(i), x.row(j))).collect())
            .collect();

        let mut k: Array2<f64> = Array2::zeros((n, n));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, val) in row.into_iter().enumerate() {
                k[[i, j]] = val;
            }
        }
        k
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::RBF { .. } => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
                (-self.gamma * norm_sq).exp()
            }
        }
    }

    fn score(&self, machine: &BinarySVM, sample: ArrayView1<f64>) -> f64 {
        machine
            .support_vectors
            .outer_iter()
            .zip(machine.dual_coef.iter())
            .map(|(sv, coef)| coef * self.kernel(sv, sample))
            .sum::<f64>()
            + machine.bias
    }

    fn check_fitted(&self, x: &Array2<f64>) -> Result<()> {
        if self.machines.is_empty() {
            return Err(CvError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(CvError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Decision values: one column for two classes, one per class otherwise
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted(x)?;
        let mut scores: Array2<f64> = Array2::zeros((x.nrows(), self.machines.len()));
        for (i, sample) in x.outer_iter().enumerate() {
            for (m, machine) in self.machines.iter().enumerate() {
                scores[[i, m]] = self.score(machine, sample);
            }
        }
        Ok(scores)
    }

    /// Predict class labels (binary and multi-class)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        let predictions = scores
            .outer_iter()
            .map(|row| {
                if self.classes.len() == 2 {
                    if row[0] >= 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    self.classes[super::decision_tree::argmax(row)]
                }
            })
            .collect();
        Ok(predictions)
    }

    /// Class probabilities from a logistic squash of the decision values
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let scores = self.decision_function(x)?;
        let n_classes = self.classes.len();
        let mut proba: Array2<f64> = Array2::zeros((x.nrows(), n_classes));

        for (i, row) in scores.outer_iter().enumerate() {
            if n_classes == 2 {
                let p = sigmoid(row[0]);
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            } else {
                let squashed: Vec<f64> = row.iter().map(|&s| sigmoid(s)).collect();
                let total: f64 = squashed.iter().sum();
                for (j, p) in squashed.into_iter().enumerate() {
                    proba[[i, j]] = if total > 0.0 { p / total } else { 1.0 / n_classes as f64 };
                }
            }
        }
        Ok(proba)
    }

    /// Absolute primal weights summed over machines (linear kernel only)
    pub fn feature_weights(&self) -> Option<Array1<f64>> {
        if self.config.kernel != KernelType::Linear || self.machines.is_empty() {
            return None;
        }
        let mut total: Array1<f64> = Array1::zeros(self.n_features);
        for machine in &self.machines {
            let w = machine.support_vectors.t().dot(&machine.dual_coef);
            total += &w.mapv(f64::abs);
        }
        Some(total)
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.nrows()).sum()
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}
