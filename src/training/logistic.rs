//! L2-regularized logistic regression

use crate::data::distinct_labels;
use crate::error::{CvError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One binary model: weights and intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinaryLogit {
    coefficients: Array1<f64>,
    intercept: f64,
}

/// Logistic regression classifier
///
/// Minimizes `C * Σ logloss + ½‖w‖²` by full-batch gradient descent; more
/// than two classes are handled One-vs-Rest with renormalized probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    classes: Vec<f64>,
    models: Vec<BinaryLogit>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            classes: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(CvError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.c.is_nan() || self.c <= 0.0 {
            return Err(CvError::InvalidParameter {
                name: "C".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let classes = distinct_labels(y.iter().copied());
        if classes.len() < 2 {
            return Err(CvError::FitError(
                "logistic regression requires at least 2 distinct classes".to_string(),
            ));
        }

        let targets: Vec<f64> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        self.models = targets
            .iter()
            .map(|&cls| {
                let y_binary = y.mapv(|v| if (v - cls).abs() < 1e-9 { 1.0 } else { 0.0 });
                self.fit_binary(x, &y_binary)
            })
            .collect();
        self.classes = classes;

        Ok(self)
    }

    fn fit_binary(&self, x: &Array2<f64>, y: &Array1<f64>) -> BinaryLogit {
        let n_samples = x.nrows() as f64;
        let alpha = 1.0 / (self.c * n_samples);

        // Step from a Lipschitz bound of the mean loss gradient
        let frob_sq: f64 = x.iter().map(|v| v * v).sum();
        let lr = 1.0 / (0.25 * (frob_sq / n_samples + 1.0) + alpha);

        let mut weights: Array1<f64> = Array1::zeros(x.ncols());
        let mut bias = 0.0;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        BinaryLogit {
            coefficients: weights,
            intercept: bias,
        }
    }

    /// Predict probabilities, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let first = self.models.first().ok_or(CvError::ModelNotFitted)?;
        if x.ncols() != first.coefficients.len() {
            return Err(CvError::ShapeError {
                expected: format!("{} features", first.coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_classes = self.classes.len();
        let mut proba: Array2<f64> = Array2::zeros((x.nrows(), n_classes));

        if n_classes == 2 {
            let p = Self::sigmoid(&(x.dot(&first.coefficients) + first.intercept));
            for (i, &pi) in p.iter().enumerate() {
                proba[[i, 0]] = 1.0 - pi;
                proba[[i, 1]] = pi;
            }
        } else {
            for (j, model) in self.models.iter().enumerate() {
                let p = Self::sigmoid(&(x.dot(&model.coefficients) + model.intercept));
                proba.column_mut(j).assign(&p);
            }
            for mut row in proba.outer_iter_mut() {
                let total = row.sum();
                if total > 0.0 {
                    row /= total;
                }
            }
        }

        Ok(proba)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .outer_iter()
            .map(|row| self.classes[super::decision_tree::argmax(row)])
            .collect())
    }

    /// Absolute coefficients summed over the One-vs-Rest models
    pub fn feature_weights(&self) -> Option<Array1<f64>> {
        let first = self.models.first()?;
        let mut total: Array1<f64> = Array1::zeros(first.coefficients.len());
        for model in &self.models {
            total += &model.coefficients.mapv(f64::abs);
        }
        Some(total)
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let correct = y_pred
            .iter()
            .zip(y.iter())
            .filter(|(pred, actual)| (*pred - *actual).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}
