//! Candidate regressors and the roster used by the model-selection loop.
//!
//! The roster is a declared array of tagged candidates iterated in fixed
//! order, which makes tie-breaking during selection deterministic.

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod linear;
pub mod tree;

pub use boosting::{AdaBoostRegressor, GradientBoostingRegressor};
pub use forest::RandomForestRegressor;
pub use knn::KnnRegressor;
pub use linear::LinearRegression;
pub use tree::DecisionTreeRegressor;

use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Common fit/predict surface for all regressors
pub trait Regressor: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// A hyperparameter assignment produced by grid search
pub type ParamSet = BTreeMap<String, f64>;

/// Exhaustive hyperparameter grid: parameter name to candidate values,
/// iterated in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub entries: Vec<(String, Vec<f64>)>,
}

impl ParamGrid {
    pub fn new(entries: Vec<(&str, Vec<f64>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Cartesian product of all entries. The first declared parameter varies
    /// slowest, so combination order is stable across runs.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combos: Vec<ParamSet> = vec![ParamSet::new()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for &value in values {
                    let mut c = combo.clone();
                    c.insert(name.clone(), value);
                    next.push(c);
                }
            }
            combos = next;
        }
        combos
    }
}

/// Which regressor a candidate constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
    AdaBoost,
    Knn,
    DecisionTree,
}

/// One entry of the model roster: a name, the regressor it builds, and an
/// optional search space.
#[derive(Debug, Clone)]
pub struct ModelCandidate {
    pub name: &'static str,
    pub kind: ModelKind,
    pub grid: Option<ParamGrid>,
}

impl ModelCandidate {
    pub fn new(name: &'static str, kind: ModelKind) -> Self {
        Self {
            name,
            kind,
            grid: None,
        }
    }

    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Construct an untrained model, applying any hyperparameters present in
    /// `params` and falling back to defaults otherwise.
    pub fn build(&self, params: &ParamSet) -> TrainedModel {
        let get_usize = |key: &str, default: usize| {
            params.get(key).map(|v| *v as usize).unwrap_or(default)
        };
        let get_f64 = |key: &str, default: f64| params.get(key).copied().unwrap_or(default);

        match self.kind {
            ModelKind::LinearRegression => TrainedModel::LinearRegression(LinearRegression::new()),
            ModelKind::RandomForest => TrainedModel::RandomForest(
                RandomForestRegressor::new(get_usize("n_estimators", 100))
                    .with_max_depth(get_usize("max_depth", 16))
                    .with_random_state(0),
            ),
            ModelKind::GradientBoosting => TrainedModel::GradientBoosting(
                GradientBoostingRegressor::new(get_usize("n_estimators", 100))
                    .with_learning_rate(get_f64("learning_rate", 0.1))
                    .with_subsample(get_f64("subsample", 1.0))
                    .with_max_depth(get_usize("max_depth", 3))
                    .with_random_state(0),
            ),
            ModelKind::AdaBoost => TrainedModel::AdaBoost(
                AdaBoostRegressor::new(get_usize("n_estimators", 50))
                    .with_learning_rate(get_f64("learning_rate", 1.0))
                    .with_random_state(0),
            ),
            ModelKind::Knn => {
                TrainedModel::Knn(KnnRegressor::new(get_usize("n_neighbors", 5)))
            }
            ModelKind::DecisionTree => TrainedModel::DecisionTree(
                DecisionTreeRegressor::new()
                    .with_max_depth(get_usize("max_depth", 16))
                    .with_min_samples_split(get_usize("min_samples_split", 2)),
            ),
        }
    }
}

/// Default candidate roster in declared order. The first four are the
/// mandatory regressors; k-NN and the plain decision tree extend the roster.
pub fn default_roster() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("Linear Regression", ModelKind::LinearRegression),
        ModelCandidate::new("Random Forest", ModelKind::RandomForest).with_grid(ParamGrid::new(
            vec![("n_estimators", vec![8.0, 16.0, 32.0, 64.0])],
        )),
        ModelCandidate::new("Gradient Boosting", ModelKind::GradientBoosting).with_grid(
            ParamGrid::new(vec![
                ("learning_rate", vec![0.1, 0.05, 0.01]),
                ("subsample", vec![0.6, 0.75, 0.9]),
                ("n_estimators", vec![8.0, 16.0, 32.0, 64.0]),
            ]),
        ),
        ModelCandidate::new("AdaBoost", ModelKind::AdaBoost).with_grid(ParamGrid::new(vec![
            ("learning_rate", vec![0.1, 0.5, 1.0]),
            ("n_estimators", vec![8.0, 16.0, 32.0, 64.0]),
        ])),
        ModelCandidate::new("K-Nearest Neighbors", ModelKind::Knn)
            .with_grid(ParamGrid::new(vec![("n_neighbors", vec![3.0, 5.0, 7.0, 9.0])])),
        ModelCandidate::new("Decision Tree", ModelKind::DecisionTree)
            .with_grid(ParamGrid::new(vec![("max_depth", vec![4.0, 6.0, 8.0, 12.0])])),
    ]
}

/// Reduced roster for the simplified all-numeric pipeline: the four mandatory
/// regressors, trained with default configuration (no grids).
pub fn reduced_roster() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("Random Forest", ModelKind::RandomForest),
        ModelCandidate::new("Gradient Boosting", ModelKind::GradientBoosting),
        ModelCandidate::new("AdaBoost", ModelKind::AdaBoost),
        ModelCandidate::new("Linear Regression", ModelKind::LinearRegression),
    ]
}

/// Enum holding any trained model variant, serializable as a single artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    AdaBoost(AdaBoostRegressor),
    Knn(KnnRegressor),
    DecisionTree(DecisionTreeRegressor),
}

impl TrainedModel {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            TrainedModel::LinearRegression(m) => m.fit(x, y),
            TrainedModel::RandomForest(m) => m.fit(x, y),
            TrainedModel::GradientBoosting(m) => m.fit(x, y),
            TrainedModel::AdaBoost(m) => m.fit(x, y),
            TrainedModel::Knn(m) => m.fit(x, y),
            TrainedModel::DecisionTree(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::LinearRegression(m) => m.predict(x),
            TrainedModel::RandomForest(m) => m.predict(x),
            TrainedModel::GradientBoosting(m) => m.predict(x),
            TrainedModel::AdaBoost(m) => m.predict(x),
            TrainedModel::Knn(m) => m.predict(x),
            TrainedModel::DecisionTree(m) => m.predict(x),
        }
    }

    /// Persist the trained model as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously persisted model.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScorecastError::ArtifactNotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)
            .map_err(|e| ScorecastError::ArtifactLoad(format!("{}: {e}", path.display())))?;
        Ok(model)
    }
}

/// Validate shapes shared by every `fit` implementation.
pub(crate) fn check_fit_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ScorecastError::Shape {
            expected: "non-empty feature matrix".to_string(),
            actual: format!("{} x {}", x.nrows(), x.ncols()),
        });
    }
    if x.nrows() != y.len() {
        return Err(ScorecastError::Shape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    Ok(())
}
