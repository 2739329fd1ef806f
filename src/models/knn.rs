//! k-nearest-neighbors regression

use super::{check_fit_shapes, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Brute-force k-NN regressor: prediction is the mean target of the k
/// training rows closest in Euclidean distance. Ties on distance resolve by
/// training-row order, which keeps predictions stable between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnRegressor {
    n_neighbors: usize,
    train_x: Option<Array2<f64>>,
    train_y: Option<Array1<f64>>,
}

impl KnnRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            train_x: None,
            train_y: None,
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn predict_row(&self, row: ArrayView1<f64>, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let mut distances: Vec<(f64, usize)> = x
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, train_row)| {
                let d: f64 = row
                    .iter()
                    .zip(train_row.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (d, i)
            })
            .collect();

        let k = self.n_neighbors.min(distances.len());
        distances.select_nth_unstable_by(k - 1, |a, b| {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
        });

        distances[..k].iter().map(|&(_, i)| y[i]).sum::<f64>() / k as f64
    }
}

impl Regressor for KnnRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        self.train_x = Some(x.clone());
        self.train_y = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (train_x, train_y) = match (&self.train_x, &self.train_y) {
            (Some(tx), Some(ty)) => (tx, ty),
            _ => return Err(ScorecastError::NotFitted),
        };
        if x.ncols() != train_x.ncols() {
            return Err(ScorecastError::Shape {
                expected: format!("{} features", train_x.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| self.predict_row(row, train_x, train_y))
            .collect())
    }
}
