//! Regression decision tree
//!
//! CART-style tree minimizing within-node variance. Used standalone and as
//! the base learner for the forest and boosting ensembles, which is why the
//! builder exposes per-split feature subsampling and a seed.

use super::{check_fit_shapes, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    feature: usize,
    threshold: f64,
    /// Child indices into the node arena; unused when `is_leaf`
    left: usize,
    right: usize,
    value: f64,
    is_leaf: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    max_depth: usize,
    min_samples_split: usize,
    /// Number of features examined per split; 0 means all
    max_features: usize,
    random_state: u64,
    nodes: Vec<Node>,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            max_depth: 16,
            min_samples_split: 2,
            max_features: 0,
            random_state: 0,
            nodes: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    fn build(
        &mut self,
        x: &ArrayView2<f64>,
        y: &ArrayView1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let node_value = mean_at(y, indices);

        let can_split = depth < self.max_depth
            && indices.len() >= self.min_samples_split
            && !constant_at(y, indices);

        let split = if can_split {
            self.best_split(x, y, indices, rng)
        } else {
            None
        };

        let node_idx = self.nodes.len();
        self.nodes.push(Node {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: node_value,
            is_leaf: true,
        });

        if let Some((feature, threshold)) = split {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature]] <= threshold);

            if !left_idx.is_empty() && !right_idx.is_empty() {
                let left = self.build(x, y, &left_idx, depth + 1, rng);
                let right = self.build(x, y, &right_idx, depth + 1, rng);

                let node = &mut self.nodes[node_idx];
                node.feature = feature;
                node.threshold = threshold;
                node.left = left;
                node.right = right;
                node.is_leaf = false;
            }
        }

        node_idx
    }

    fn best_split(
        &self,
        x: &ArrayView2<f64>,
        y: &ArrayView1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let mut feature_pool: Vec<usize> = (0..n_features).collect();
        if self.max_features > 0 && self.max_features < n_features {
            feature_pool.shuffle(rng);
            feature_pool.truncate(self.max_features);
            feature_pool.sort_unstable();
        }

        let parent_sse = sse_at(y, indices);
        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = 1e-12;

        for &feature in &feature_pool {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            // Prefix sums over the sorted order give O(1) per-threshold SSE
            let n = sorted.len();
            let mut prefix_sum = 0.0;
            let mut prefix_sq = 0.0;
            let total_sum: f64 = sorted.iter().map(|&i| y[i]).sum();
            let total_sq: f64 = sorted.iter().map(|&i| y[i] * y[i]).sum();

            for k in 0..n - 1 {
                let i = sorted[k];
                prefix_sum += y[i];
                prefix_sq += y[i] * y[i];

                let left_val = x[[i, feature]];
                let right_val = x[[sorted[k + 1], feature]];
                if left_val == right_val {
                    continue;
                }

                let nl = (k + 1) as f64;
                let nr = (n - k - 1) as f64;
                let left_sse = prefix_sq - prefix_sum * prefix_sum / nl;
                let right_sum = total_sum - prefix_sum;
                let right_sse = (total_sq - prefix_sq) - right_sum * right_sum / nr;

                let gain = parent_sse - left_sse - right_sse;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (left_val + right_val) / 2.0));
                }
            }
        }

        best
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.value;
            }
            idx = if row[node.feature] <= node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        self.nodes.clear();
        self.n_features = x.ncols();

        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        self.build(&x.view(), &y.view(), &indices, 0, &mut rng);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(ScorecastError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ScorecastError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}

fn mean_at(y: &ArrayView1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn constant_at(y: &ArrayView1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| y[i] == first)
}

fn sse_at(y: &ArrayView1<f64>, indices: &[usize]) -> f64 {
    let mean = mean_at(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTreeRegressor::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&array![[2.5], [10.5]]).unwrap();
        assert!((pred[0] - 5.0).abs() < 1e-10);
        assert!((pred[1] - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_depth_one_is_a_stump() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 10.0, 11.0];

        let mut tree = DecisionTreeRegressor::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        // A stump yields at most two distinct predictions
        let pred = tree.predict(&x).unwrap();
        let mut distinct: Vec<f64> = pred.to_vec();
        distinct.sort_by(|a, b| a.partial_cmp(b).unwrap());
        distinct.dedup();
        assert!(distinct.len() <= 2);
    }

    #[test]
    fn test_constant_target_gives_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&array![[99.0]]).unwrap();
        assert_eq!(pred[0], 7.0);
    }

    #[test]
    fn test_deterministic_with_feature_subsampling() {
        let x = array![
            [1.0, 9.0],
            [2.0, 8.0],
            [3.0, 1.0],
            [4.0, 2.0],
            [5.0, 7.0],
            [6.0, 3.0]
        ];
        let y = array![1.0, 1.5, 8.0, 8.5, 2.0, 9.0];

        let mut a = DecisionTreeRegressor::new()
            .with_max_features(1)
            .with_random_state(42);
        let mut b = DecisionTreeRegressor::new()
            .with_max_features(1)
            .with_random_state(42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let tree = DecisionTreeRegressor::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]).unwrap_err(),
            ScorecastError::NotFitted
        ));
    }
}
