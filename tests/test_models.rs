//! Integration tests for the model factory and classifiers

use kolosal_cv::prelude::*;
use kolosal_cv::search::linspace;
use kolosal_cv::selection::FeatureSelector;
use ndarray::{array, Array1, Array2};

fn blobs() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((24, 3), |(i, j)| {
        let offset = if i % 2 == 0 { -2.0 } else { 2.0 };
        if j == 2 {
            ((i * 5) % 7) as f64 * 0.1
        } else {
            offset + ((i + j) % 3) as f64 * 0.2
        }
    });
    let y = Array1::from_shape_fn(24, |i| (i % 2) as f64);
    (x, y)
}

// ============================================================================
// Factory
// ============================================================================

#[test]
fn test_factory_grid_sizes() {
    let cases = [
        (ModelKind::RandomForest, 3),
        (ModelKind::LinearSvm, 5),
        (ModelKind::RbfSvm, 25),
        (ModelKind::LogisticRegression, 5),
    ];
    for (kind, expected) in cases {
        let (model, grid) = ModelFactory::build(kind, 5).unwrap();
        assert_eq!(model.kind(), kind);
        assert_eq!(grid.n_candidates(), expected, "{}", kind);
    }
}

#[test]
fn test_factory_c_values_are_linspace() {
    let (_, grid) = ModelFactory::build(ModelKind::RbfSvm, 4).unwrap();
    let c: Vec<f64> = grid.values("C").unwrap().iter().filter_map(|v| v.as_float()).collect();
    let gamma: Vec<f64> = grid.values("gamma").unwrap().iter().filter_map(|v| v.as_float()).collect();
    assert_eq!(c, linspace(0.0001, 10.0, 4));
    assert_eq!(gamma, linspace(0.01, 100.0, 4));
}

#[test]
fn test_factory_by_name() {
    let (model, _) = ModelFactory::build_named("logistic-regression", 2).unwrap();
    assert_eq!(model.kind(), ModelKind::LogisticRegression);
    assert!(matches!(ModelFactory::build_named("gbm", 2), Err(CvError::ConfigError(_))));
    assert!(matches!(ModelFactory::build(ModelKind::LinearSvm, 0), Err(CvError::ConfigError(_))));
}

// ============================================================================
// Classifier contract
// ============================================================================

#[test]
fn test_every_kind_fits_and_predicts() {
    let (x, y) = blobs();
    for kind in ModelKind::all() {
        let (model, _) = ModelFactory::build(kind, 3).unwrap();
        let mut model = model.with_random_state(3);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.classes(), &[0.0, 1.0]);
        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.len(), 24);
        assert!(pred.iter().all(|p| *p == 0.0 || *p == 1.0));

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (24, 2));
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-6, "{} rows must sum to one", kind);
        }
    }
}

#[test]
fn test_feature_weights_by_kind() {
    let (x, y) = blobs();
    for kind in ModelKind::all() {
        let mut model = ClassifierModel::new(kind);
        model.fit(&x, &y).unwrap();
        let weights = model.feature_weights();
        match kind {
            ModelKind::RbfSvm => assert!(weights.is_none()),
            _ => assert_eq!(weights.unwrap().len(), 3),
        }
    }
}

#[test]
fn test_set_params_from_grid() {
    let (_, grid) = ModelFactory::build(ModelKind::RbfSvm, 2).unwrap();
    let mut model = ClassifierModel::new(ModelKind::RbfSvm);
    for candidate in grid.candidates() {
        model.set_params(&candidate).unwrap();
    }

    let bad = ParamSet::new().with("n_estimators", ParamValue::Int(10));
    assert!(model.set_params(&bad).is_err());
}

#[test]
fn test_single_class_fit_fails() {
    let x = array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]];
    let y = array![1.0, 1.0, 1.0];
    for kind in ModelKind::all() {
        let mut model = ClassifierModel::new(kind);
        assert!(matches!(model.fit(&x, &y), Err(CvError::FitError(_))), "{}", kind);
    }
}

// ============================================================================
// Selection and search on real models
// ============================================================================

#[test]
fn test_selector_keeps_informative_columns() {
    let (x, y) = blobs();
    let model = ClassifierModel::new(ModelKind::LogisticRegression);
    let selection = FeatureSelector::new(3).fit(&model, &x, &y).unwrap();

    assert_eq!(selection.support().len(), 3);
    assert!(selection.n_features() >= 1);
    let reduced = selection.transform(&x).unwrap();
    assert_eq!(reduced.ncols(), selection.n_features());
}

#[test]
fn test_grid_search_picks_a_candidate() {
    let (x, y) = blobs();
    let (model, grid) = ModelFactory::build(ModelKind::LinearSvm, 3).unwrap();
    let candidates = grid.candidates();
    let result = GridSearch::new(grid, 3).fit(&model, &x, &y).unwrap();

    assert!(candidates.contains(&result.best_params));
    assert_eq!(result.cv_results.len(), 3);
    assert!(result.best_score > 0.5);
    assert_eq!(result.best_estimator.predict(&x).unwrap().len(), 24);
}
