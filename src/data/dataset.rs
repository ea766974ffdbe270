//! In-memory tabular dataset

use crate::error::{CvError, Result};
use ndarray::{Array1, Array2, Axis};

/// Feature matrix, label vector and optional header
///
/// Labels are integral class codes stored as `f64`, the representation the
/// classifiers work with.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Array1<f64>,
    header: Option<Vec<String>>,
    class_names: Option<Vec<String>>,
}

impl Dataset {
    /// Build a dataset, checking row counts and header width
    pub fn new(x: Array2<f64>, y: Array1<f64>, header: Option<Vec<String>>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(CvError::ShapeError {
                expected: format!("{} labels (one per row)", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if let Some(names) = &header {
            if names.len() != x.ncols() {
                return Err(CvError::ShapeError {
                    expected: format!("header of width {}", x.ncols()),
                    actual: format!("header of width {}", names.len()),
                });
            }
        }
        if let Some((i, v)) = y.iter().enumerate().find(|(_, v)| (*v - v.round()).abs() > 1e-9) {
            return Err(CvError::DataError(format!(
                "labels must be integral class codes, row {} has {}",
                i, v
            )));
        }
        Ok(Self {
            x,
            y,
            header,
            class_names: None,
        })
    }

    /// Attach the original class names, indexed by label code
    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = Some(names);
        self
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Sorted distinct labels
    pub fn classes(&self) -> Vec<f64> {
        distinct_labels(self.y.iter().copied())
    }

    /// Rows `indices` of the feature matrix and label vector
    pub fn subset(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (self.x.select(Axis(0), indices), self.y.select(Axis(0), indices))
    }
}

/// Sorted, deduplicated label values
pub fn distinct_labels(labels: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = labels.into_iter().collect();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}
