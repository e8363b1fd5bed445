//! Accuracy regression tests for imbal-learn.
//!
//! A deterministic, imbalanced two-class dataset is pushed through the same
//! holdout -> SMOTE -> tree -> confusion chain the evaluator uses.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use imbal_learn::{
    ClassSelection, ConfusionMatrix, DecisionTreeConfig, FeatureKind, SmoteConfig,
    StratifiedFolds,
};

// ---------------------------------------------------------------------------
// Helper: deterministic imbalanced dataset
// ---------------------------------------------------------------------------

/// 400 majority rows and 100 minority rows, 4 features.
///
/// Features 0-1 carry the class signal (minority shifted by +2.0),
/// features 2-3 are uniform noise in [0, 1).
fn make_imbalanced() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut features = Vec::with_capacity(500);
    let mut labels = Vec::with_capacity(500);
    for i in 0..500 {
        let class = usize::from(i % 5 == 0);
        let shift = class as f64 * 2.0;
        features.push(vec![
            shift + rng.r#gen::<f64>(),
            shift + rng.r#gen::<f64>(),
            rng.r#gen::<f64>(),
            rng.r#gen::<f64>(),
        ]);
        labels.push(class);
    }
    (features, labels)
}

fn pick(rows: &[usize], features: &[Vec<f64>], labels: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
    (
        rows.iter().map(|&i| features[i].clone()).collect(),
        rows.iter().map(|&i| labels[i]).collect(),
    )
}

// ---------------------------------------------------------------------------
// a) holdout_smote_tree_scores_well
// ---------------------------------------------------------------------------

/// The full chain must separate the well-separated classes on every seed.
#[test]
fn holdout_smote_tree_scores_well() {
    let (features, labels) = make_imbalanced();
    let kinds = [FeatureKind::Numeric; 4];

    for seed in [1, 17, 50] {
        let split = StratifiedFolds::new(5)
            .unwrap()
            .with_seed(seed)
            .holdout(&labels, 1)
            .unwrap();
        let (train_x, train_y) = pick(&split.train, &features, &labels);
        let (test_x, test_y) = pick(&split.test, &features, &labels);

        // 320 majority / 80 minority in train -> 300%.
        let resampled = SmoteConfig::new(300.0)
            .unwrap()
            .with_class(ClassSelection::Label(1))
            .resample(&train_x, &train_y, &kinds)
            .unwrap();
        assert_eq!(resampled.n_synthetic, 240);

        let tree = DecisionTreeConfig::new()
            .fit(&resampled.features, &resampled.labels)
            .unwrap();
        let predicted = tree.predict_batch(&test_x).unwrap();
        let cm = ConfusionMatrix::from_labels(&test_y, &predicted, 2).unwrap();

        assert!(cm.accuracy() > 0.95, "seed {seed}: accuracy {}", cm.accuracy());
        assert!(
            cm.metrics_for(1).recall > 0.9,
            "seed {seed}: minority recall {}",
            cm.metrics_for(1).recall
        );
    }
}

// ---------------------------------------------------------------------------
// b) oversampling_balances_training_classes
// ---------------------------------------------------------------------------

/// After oversampling by `(majority / minority - 1) * 100` the classes are equal.
#[test]
fn oversampling_balances_training_classes() {
    let (features, labels) = make_imbalanced();
    let majority = labels.iter().filter(|&&l| l == 0).count();
    let minority = labels.len() - majority;
    let percentage = (majority as f64 / minority as f64 - 1.0) * 100.0;

    let out = SmoteConfig::new(percentage)
        .unwrap()
        .resample(&features, &labels, &[FeatureKind::Numeric; 4])
        .unwrap();
    let resampled_minority = out.labels.iter().filter(|&&l| l == 1).count();
    assert_eq!(out.class, 1);
    assert_eq!(resampled_minority, majority);
}

// ---------------------------------------------------------------------------
// c) deterministic_chain
// ---------------------------------------------------------------------------

/// Identical seeds must give identical predictions.
#[test]
fn deterministic_chain() {
    let (features, labels) = make_imbalanced();
    let run = || {
        let out = SmoteConfig::new(100.0)
            .unwrap()
            .with_seed(3)
            .resample(&features, &labels, &[FeatureKind::Numeric; 4])
            .unwrap();
        DecisionTreeConfig::new()
            .fit(&out.features, &out.labels)
            .unwrap()
            .predict_batch(&features)
            .unwrap()
    };
    assert_eq!(run(), run());
}
