//! Candidate evaluation: cross-validated grid search and held-out scoring
//!
//! Every candidate in the roster is tuned (when it declares a grid) with
//! 3-fold cross-validation on the training split only, refit on the full
//! training split with its winning parameters, then scored once on the
//! held-out test split. Selection works on the held-out scores.

use crate::error::{Result, ScorecastError};
use crate::models::{ModelCandidate, ParamSet, TrainedModel};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Number of cross-validation folds used during grid search
pub const CV_FOLDS: usize = 3;

/// Coefficient of determination. A constant target (zero total variance)
/// scores 0.0 rather than dividing by zero.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mean = match y_true.mean() {
        Some(m) => m,
        None => return 0.0,
    };
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Shuffled fold assignment: returns `folds` disjoint index sets covering
/// `0..n`. The shuffle is seeded so splits are reproducible.
pub fn k_fold_indices(n: usize, folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let folds = folds.min(n).max(1);
    let mut out = vec![Vec::with_capacity(n / folds + 1); folds];
    for (i, idx) in indices.into_iter().enumerate() {
        out[i % folds].push(idx);
    }
    out
}

/// Mean cross-validated R² of a candidate at one parameter assignment.
fn cross_val_r2(
    candidate: &ModelCandidate,
    params: &ParamSet,
    x: &Array2<f64>,
    y: &Array1<f64>,
    seed: u64,
) -> Result<f64> {
    let folds = k_fold_indices(x.nrows(), CV_FOLDS, seed);
    let mut total = 0.0;

    for (f, validation) in folds.iter().enumerate() {
        let train: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(g, _)| *g != f)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();

        let x_train = x.select(Axis(0), &train);
        let y_train = y.select(Axis(0), &train);
        let x_val = x.select(Axis(0), validation);
        let y_val = y.select(Axis(0), validation);

        let mut model = candidate.build(params);
        model.fit(&x_train, &y_train)?;
        let pred = model.predict(&x_val)?;
        total += r2_score(&y_val, &pred);
    }

    Ok(total / folds.len() as f64)
}

/// Exhaustive grid search over a candidate's declared parameter grid.
/// Ties keep the earliest combination; a NaN fold score never wins.
fn grid_search(
    candidate: &ModelCandidate,
    x: &Array2<f64>,
    y: &Array1<f64>,
    seed: u64,
) -> Result<ParamSet> {
    let grid = match &candidate.grid {
        Some(grid) => grid,
        None => return Ok(ParamSet::new()),
    };

    let mut best_params = ParamSet::new();
    let mut best_score = f64::NEG_INFINITY;

    for params in grid.combinations() {
        let score = cross_val_r2(candidate, &params, x, y, seed)?;
        let score = if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        };
        debug!(model = candidate.name, ?params, cv_r2 = score, "grid point");
        if score > best_score {
            best_score = score;
            best_params = params;
        }
    }

    Ok(best_params)
}

/// One fully evaluated roster entry.
#[derive(Debug)]
pub struct EvaluatedModel {
    pub name: &'static str,
    pub test_r2: f64,
    pub train_r2: f64,
    pub model: TrainedModel,
    pub params: ParamSet,
}

/// All candidates evaluated, in roster order.
#[derive(Debug)]
pub struct EvaluationReport {
    pub entries: Vec<EvaluatedModel>,
}

impl EvaluationReport {
    /// Highest held-out R²; the earliest roster entry wins ties because
    /// later entries must score strictly higher to displace it.
    pub fn best(&self) -> Option<&EvaluatedModel> {
        let mut best: Option<&EvaluatedModel> = None;
        let mut best_score = f64::NEG_INFINITY;
        for entry in &self.entries {
            let score = if entry.test_r2.is_nan() {
                f64::NEG_INFINITY
            } else {
                entry.test_r2
            };
            if best.is_none() || score > best_score {
                best = Some(entry);
                best_score = score;
            }
        }
        best
    }
}

/// Tune, refit, and score every roster candidate.
///
/// Fails fast on the first candidate whose fit errors; a partial report is
/// never returned. Candidate names must be unique and the roster non-empty.
pub fn evaluate_models(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
    roster: &[ModelCandidate],
    seed: u64,
) -> Result<EvaluationReport> {
    if roster.is_empty() {
        return Err(ScorecastError::Training(
            "candidate roster is empty".to_string(),
        ));
    }
    for (i, candidate) in roster.iter().enumerate() {
        if roster[..i].iter().any(|c| c.name == candidate.name) {
            return Err(ScorecastError::Training(format!(
                "duplicate candidate name: {}",
                candidate.name
            )));
        }
    }

    let mut entries = Vec::with_capacity(roster.len());

    for candidate in roster {
        let params = grid_search(candidate, x_train, y_train, seed).map_err(|e| {
            ScorecastError::Training(format!("{} grid search failed: {e}", candidate.name))
        })?;

        let mut model = candidate.build(&params);
        model.fit(x_train, y_train).map_err(|e| {
            ScorecastError::Training(format!("{} fit failed: {e}", candidate.name))
        })?;

        let train_pred = model.predict(x_train)?;
        let test_pred = model.predict(x_test)?;
        let train_r2 = r2_score(y_train, &train_pred);
        let test_r2 = r2_score(y_test, &test_pred);

        info!(
            model = candidate.name,
            test_r2,
            train_r2,
            ?params,
            "candidate evaluated"
        );

        entries.push(EvaluatedModel {
            name: candidate.name,
            test_r2,
            train_r2,
            model,
            params,
        });
    }

    Ok(EvaluationReport { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelKind, ParamGrid};
    use ndarray::array;

    #[test]
    fn test_r2_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), 1.0);
    }

    #[test]
    fn test_r2_mean_prediction_is_zero() {
        let y = array![1.0, 2.0, 3.0];
        let pred = array![2.0, 2.0, 2.0];
        assert!(r2_score(&y, &pred).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![5.0, 5.0, 5.0];
        let pred = array![4.0, 5.0, 6.0];
        assert_eq!(r2_score(&y, &pred), 0.0);
    }

    #[test]
    fn test_r2_worse_than_mean_is_negative() {
        let y = array![1.0, 2.0, 3.0];
        let pred = array![3.0, 1.0, 2.0];
        assert!(r2_score(&y, &pred) < 0.0);
    }

    #[test]
    fn test_k_fold_partition() {
        let folds = k_fold_indices(10, 3, 38);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        // Fold sizes differ by at most one
        let sizes: Vec<usize> = folds.iter().map(|f| f.len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_k_fold_is_seeded() {
        assert_eq!(k_fold_indices(20, 3, 7), k_fold_indices(20, 3, 7));
        assert_ne!(k_fold_indices(20, 3, 7), k_fold_indices(20, 3, 8));
    }

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| 3.0 * i as f64 + 2.0);
        (x, y)
    }

    #[test]
    fn test_evaluate_models_report_order_matches_roster() {
        let (x, y) = linear_data(30);
        let roster = vec![
            ModelCandidate::new("Linear Regression", ModelKind::LinearRegression),
            ModelCandidate::new("Decision Tree", ModelKind::DecisionTree)
                .with_grid(ParamGrid::new(vec![("max_depth", vec![2.0, 4.0])])),
        ];

        let report = evaluate_models(&x, &y, &x, &y, &roster, 38).unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].name, "Linear Regression");
        assert_eq!(report.entries[1].name, "Decision Tree");
        for entry in &report.entries {
            assert!(entry.test_r2.is_finite());
            assert!(entry.test_r2 <= 1.0);
        }
    }

    #[test]
    fn test_best_prefers_earlier_on_tie() {
        let dummy = || {
            let (x, y) = linear_data(10);
            let mut m = crate::models::LinearRegression::new();
            crate::models::Regressor::fit(&mut m, &x, &y).unwrap();
            TrainedModel::LinearRegression(m)
        };
        let report = EvaluationReport {
            entries: vec![
                EvaluatedModel {
                    name: "first",
                    test_r2: 0.9,
                    train_r2: 0.9,
                    model: dummy(),
                    params: ParamSet::new(),
                },
                EvaluatedModel {
                    name: "second",
                    test_r2: 0.9,
                    train_r2: 0.9,
                    model: dummy(),
                    params: ParamSet::new(),
                },
            ],
        };
        assert_eq!(report.best().unwrap().name, "first");
    }

    #[test]
    fn test_fit_failure_aborts_evaluation() {
        // A zero-column feature matrix makes every fit fail; the evaluation
        // must abort with a Training error instead of returning a report.
        let x = Array2::<f64>::zeros((10, 0));
        let y = Array1::from_elem(10, 1.0);
        let roster = vec![
            ModelCandidate::new("Linear Regression", ModelKind::LinearRegression),
            ModelCandidate::new("Decision Tree", ModelKind::DecisionTree),
        ];

        let err = evaluate_models(&x, &y, &x, &y, &roster, 38).unwrap_err();
        match err {
            ScorecastError::Training(msg) => {
                // The failing candidate is named so the cause is traceable
                assert!(msg.contains("Linear Regression"), "got: {msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_roster_is_an_error() {
        let (x, y) = linear_data(10);
        let err = evaluate_models(&x, &y, &x, &y, &[], 38).unwrap_err();
        assert!(matches!(err, ScorecastError::Training(_)));
    }

    #[test]
    fn test_duplicate_names_are_an_error() {
        let (x, y) = linear_data(10);
        let roster = vec![
            ModelCandidate::new("dup", ModelKind::LinearRegression),
            ModelCandidate::new("dup", ModelKind::Knn),
        ];
        let err = evaluate_models(&x, &y, &x, &y, &roster, 38).unwrap_err();
        assert!(matches!(err, ScorecastError::Training(_)));
    }
}
