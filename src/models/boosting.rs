//! Boosting ensembles: gradient boosting and AdaBoost.R2

use super::{check_fit_shapes, DecisionTreeRegressor, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Gradient boosted trees for squared-error regression.
///
/// Starts from the target mean, then fits each tree to the residuals of the
/// running prediction, shrunk by the learning rate. `subsample < 1` fits each
/// tree on a random row fraction (stochastic gradient boosting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    n_estimators: usize,
    learning_rate: f64,
    subsample: f64,
    max_depth: usize,
    random_state: u64,
    base_prediction: f64,
    trees: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            learning_rate: 0.1,
            subsample: 1.0,
            max_depth: 3,
            random_state: 0,
            base_prediction: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample.clamp(0.1, 1.0);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);

        self.base_prediction = y.mean().unwrap_or(0.0);
        self.trees = Vec::with_capacity(self.n_estimators);

        let mut current = Array1::from_elem(n, self.base_prediction);
        let sample_size = ((n as f64 * self.subsample).round() as usize).clamp(1, n);

        for _ in 0..self.n_estimators {
            let residuals = y - &current;

            let mut tree = DecisionTreeRegressor::new().with_max_depth(self.max_depth);

            if sample_size < n {
                let mut rows: Vec<usize> = (0..n).collect();
                rows.shuffle(&mut rng);
                rows.truncate(sample_size);
                let xs = x.select(Axis(0), &rows);
                let rs = residuals.select(Axis(0), &rows);
                tree.fit(&xs, &rs)?;
            } else {
                tree.fit(x, &residuals)?;
            }

            current = current + tree.predict(x)? * self.learning_rate;
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ScorecastError::NotFitted);
        }
        let mut pred = Array1::from_elem(x.nrows(), self.base_prediction);
        for tree in &self.trees {
            pred = pred + tree.predict(x)? * self.learning_rate;
        }
        Ok(pred)
    }
}

/// AdaBoost.R2 with depth-3 tree base learners and linear loss.
///
/// Each round draws a weighted bootstrap, fits a tree, and converts the
/// weighted average loss into an estimator weight. Prediction is the
/// weighted median of the estimators' outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    n_estimators: usize,
    learning_rate: f64,
    random_state: u64,
    trees: Vec<DecisionTreeRegressor>,
    /// log(1 / beta) per estimator
    estimator_weights: Vec<f64>,
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            learning_rate: 1.0,
            random_state: 0,
            trees: Vec::new(),
            estimator_weights: Vec::new(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Weighted bootstrap draw: sample indices proportionally to `weights`.
    fn weighted_sample(weights: &[f64], n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for &w in weights {
            acc += w;
            cumulative.push(acc);
        }
        let total = acc;

        (0..n)
            .map(|_| {
                let r: f64 = rng.gen_range(0.0..total);
                cumulative.partition_point(|&c| c <= r).min(weights.len() - 1)
            })
            .collect()
    }
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut weights = vec![1.0 / n as f64; n];

        self.trees = Vec::with_capacity(self.n_estimators);
        self.estimator_weights = Vec::with_capacity(self.n_estimators);

        for round in 0..self.n_estimators {
            let sample = Self::weighted_sample(&weights, n, &mut rng);
            let xs = x.select(Axis(0), &sample);
            let ys = y.select(Axis(0), &sample);

            let mut tree = DecisionTreeRegressor::new().with_max_depth(3);
            tree.fit(&xs, &ys)?;
            let pred = tree.predict(x)?;

            // Linear loss normalized by the largest absolute error
            let abs_err: Vec<f64> = pred
                .iter()
                .zip(y.iter())
                .map(|(p, t)| (p - t).abs())
                .collect();
            let max_err = abs_err.iter().cloned().fold(0.0_f64, f64::max);
            if max_err == 0.0 {
                // Perfect fit, keep it with full confidence and stop
                self.trees.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }

            let avg_loss: f64 = abs_err
                .iter()
                .zip(weights.iter())
                .map(|(e, w)| (e / max_err) * w)
                .sum();

            if avg_loss >= 0.5 {
                // Worse than random for this weighting, discard and stop
                if round == 0 {
                    self.trees.push(tree);
                    self.estimator_weights.push(1.0);
                }
                break;
            }

            let beta = avg_loss / (1.0 - avg_loss);
            self.estimator_weights
                .push(self.learning_rate * (1.0 / beta).ln());

            // Downweight well-predicted rows for the next round
            let mut total = 0.0;
            for (w, e) in weights.iter_mut().zip(abs_err.iter()) {
                *w *= beta.powf(self.learning_rate * (1.0 - e / max_err));
                total += *w;
            }
            for w in weights.iter_mut() {
                *w /= total;
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ScorecastError::NotFitted);
        }

        let all_preds: Vec<Array1<f64>> = self
            .trees
            .iter()
            .map(|t| t.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let half_weight: f64 = self.estimator_weights.iter().sum::<f64>() / 2.0;

        let out = (0..x.nrows())
            .map(|row| {
                // Weighted median over estimator outputs
                let mut pairs: Vec<(f64, f64)> = all_preds
                    .iter()
                    .zip(self.estimator_weights.iter())
                    .map(|(p, &w)| (p[row], w))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut acc = 0.0;
                for (value, weight) in &pairs {
                    acc += weight;
                    if acc >= half_weight {
                        return *value;
                    }
                }
                pairs.last().map(|(v, _)| *v).unwrap_or(0.0)
            })
            .collect();

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(40, |i| 2.0 * i as f64 + 1.0);
        (x, y)
    }

    #[test]
    fn test_gradient_boosting_reduces_error() {
        let (x, y) = ramp_data();

        let mut weak = GradientBoostingRegressor::new(1);
        let mut strong = GradientBoostingRegressor::new(50);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();

        let err = |m: &GradientBoostingRegressor| {
            let p = m.predict(&x).unwrap();
            p.iter()
                .zip(y.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        };
        assert!(err(&strong) < err(&weak));
    }

    #[test]
    fn test_gradient_boosting_subsample_is_deterministic() {
        let (x, y) = ramp_data();
        let mut a = GradientBoostingRegressor::new(10)
            .with_subsample(0.7)
            .with_random_state(5);
        let mut b = GradientBoostingRegressor::new(10)
            .with_subsample(0.7)
            .with_random_state(5);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_adaboost_fits_step() {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(30, |i| if i < 15 { 1.0 } else { 9.0 });

        let mut model = AdaBoostRegressor::new(20).with_random_state(38);
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&array![[3.0], [25.0]]).unwrap();
        assert!(pred[0] < 5.0);
        assert!(pred[1] > 5.0);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let gb = GradientBoostingRegressor::new(5);
        assert!(matches!(
            gb.predict(&array![[1.0]]).unwrap_err(),
            ScorecastError::NotFitted
        ));

        let ada = AdaBoostRegressor::new(5);
        assert!(matches!(
            ada.predict(&array![[1.0]]).unwrap_err(),
            ScorecastError::NotFitted
        ));
    }
}
