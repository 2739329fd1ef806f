//! Random forest regressor
//!
//! Bootstrap-aggregated trees with sqrt feature subsampling per split.
//! Trees are trained in parallel; each tree derives its own seed from the
//! forest seed so results stay reproducible regardless of thread scheduling.

use super::{check_fit_shapes, DecisionTreeRegressor, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    max_depth: usize,
    random_state: u64,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth: 16,
            random_state: 0,
            trees: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let n = x.nrows();
        let max_features = ((x.ncols() as f64).sqrt().ceil() as usize).max(1);
        let max_depth = self.max_depth;
        let base_seed = self.random_state;

        self.trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let seed = base_seed.wrapping_add(t as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample with replacement
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let xb = x.select(Axis(0), &sample);
                let yb = y.select(Axis(0), &sample);

                let mut tree = DecisionTreeRegressor::new()
                    .with_max_depth(max_depth)
                    .with_max_features(max_features)
                    .with_random_state(seed);
                tree.fit(&xb, &yb)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ScorecastError::NotFitted);
        }

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            sum = sum + tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0],
            [2.0],
            [3.0],
            [4.0],
            [10.0],
            [11.0],
            [12.0],
            [13.0]
        ];
        let y = array![2.0, 2.1, 1.9, 2.0, 15.0, 15.2, 14.8, 15.0];
        (x, y)
    }

    #[test]
    fn test_forest_separates_clusters() {
        let (x, y) = toy_data();
        let mut forest = RandomForestRegressor::new(16).with_random_state(38);
        forest.fit(&x, &y).unwrap();

        let pred = forest.predict(&array![[2.5], [11.5]]).unwrap();
        assert!(pred[0] < 8.0);
        assert!(pred[1] > 8.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = toy_data();
        let mut a = RandomForestRegressor::new(8).with_random_state(7);
        let mut b = RandomForestRegressor::new(8).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForestRegressor::new(4);
        assert!(matches!(
            forest.predict(&array![[1.0]]).unwrap_err(),
            ScorecastError::NotFitted
        ));
    }
}
