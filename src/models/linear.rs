//! Ordinary least squares linear regression

use super::{check_fit_shapes, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// OLS regressor solved via the normal equations with an intercept term.
///
/// The normal matrix gets a tiny ridge on the diagonal so collinear one-hot
/// blocks (each categorical column sums to a constant) stay solvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let n = x.nrows();
        let d = x.ncols();

        // Augment with an intercept column of ones
        let mut xa = Array2::ones((n, d + 1));
        xa.slice_mut(ndarray::s![.., ..d]).assign(x);

        // Normal equations: (X'X + eps I) w = X'y
        let xt = xa.t();
        let mut xtx = xt.dot(&xa);
        let xty = xt.dot(y);
        for i in 0..=d {
            xtx[[i, i]] += 1e-10;
        }

        let w = solve_linear_system(&xtx, &xty).ok_or_else(|| {
            ScorecastError::Training("linear regression normal equations are singular".to_string())
        })?;

        self.intercept = w[d];
        self.coefficients = Some(w.slice(ndarray::s![..d]).to_owned());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ScorecastError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ScorecastError::Shape {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
/// Returns `None` when a pivot collapses to zero.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.slice_mut(ndarray::s![.., n]).assign(b);

    for col in 0..n {
        // Partial pivot
        let mut pivot_row = col;
        let mut pivot_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            let v = aug[[row, col]].abs();
            if v > pivot_val {
                pivot_row = row;
                pivot_val = v;
            }
        }
        if pivot_val < 1e-14 {
            return None;
        }
        if pivot_row != col {
            for k in 0..=n {
                aug.swap([col, k], [pivot_row, k]);
            }
        }

        let pivot = aug[[col, col]];
        for row in (col + 1)..n {
            let factor = aug[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                aug[[row, k]] -= factor * aug[[col, k]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = aug[[row, n]];
        for k in (row + 1)..n {
            sum -= aug[[row, k]] * x[k];
        }
        x[row] = sum / aug[[row, row]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_known_line() {
        // y = 2x + 1
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-6);
        assert!((model.intercept() - 1.0).abs() < 1e-6);

        let pred = model.predict(&array![[5.0]]).unwrap();
        assert!((pred[0] - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_features() {
        // y = 3a - b + 4
        let x = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [3.0, 0.0]
        ];
        let y = array![7.0, 3.0, 9.0, 5.0, 13.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegression::new();
        let err = model.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, ScorecastError::NotFitted));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let mut model = LinearRegression::new();
        model
            .fit(&array![[1.0], [2.0]], &array![1.0, 2.0])
            .unwrap();
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ScorecastError::Shape { .. }));
    }
}
