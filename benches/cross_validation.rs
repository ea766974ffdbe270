use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use kolosal_cv::prelude::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let y = Array1::from_shape_fn(n_rows, |i| (i % 2) as f64);
    // Class 1 is shifted along every feature
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        y[i] * 1.5 + rng.gen::<f64>() * 2.0
    });

    Dataset::new(x, y, None).unwrap()
}

fn bench_orchestrator(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_validation");
    group.sample_size(10); // Each sample runs a full K-fold pass

    for n_rows in [200, 1000].iter() {
        let dataset = create_classification_data(*n_rows, 8);

        for kind in [ModelKind::LogisticRegression, ModelKind::LinearSvm] {
            let orchestrator =
                CrossValidationOrchestrator::new(CvConfig::new(kind).with_n_splits(5)).unwrap();
            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), n_rows),
                &dataset,
                |b, ds| b.iter(|| orchestrator.run(black_box(ds)).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    let dataset = create_classification_data(500, 8);
    let (x, y) = (dataset.x().clone(), dataset.y().clone());

    for trials in [2, 4].iter() {
        let (model, grid) = ModelFactory::build(ModelKind::LogisticRegression, *trials).unwrap();
        let search = GridSearch::new(grid, 3);
        group.bench_with_input(BenchmarkId::new("logistic_regression", trials), trials, |b, _| {
            b.iter(|| search.fit(black_box(&model), &x, &y).unwrap())
        });
    }

    group.finish();
}

fn bench_feature_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_selection");
    group.sample_size(10);

    for n_features in [4, 8].iter() {
        let dataset = create_classification_data(300, *n_features);
        let (x, y) = (dataset.x().clone(), dataset.y().clone());
        let model = ClassifierModel::new(ModelKind::LogisticRegression);

        group.bench_with_input(BenchmarkId::new("rfecv", n_features), n_features, |b, _| {
            b.iter(|| FeatureSelector::new(3).fit(black_box(&model), &x, &y).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_orchestrator, bench_grid_search, bench_feature_selection);
criterion_main!(benches);
