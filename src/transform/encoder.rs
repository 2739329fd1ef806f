//! One-hot encoding of categorical columns

use crate::error::{Result, ScorecastError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One-hot encoder over string columns.
///
/// Categories are frozen at fit time in sorted order per column. At transform
/// time an unseen category maps to the all-zero indicator row instead of
/// failing. Each indicator column is additionally scaled by its training-set
/// standard deviation without mean-centering, preserving sparsity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// (column name, sorted category list) in declared column order
    categories: Vec<(String, Vec<String>)>,
    /// Per output-indicator scale, aligned with `output_names` order
    scales: Vec<f64>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            scales: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.categories.clear();
        self.scales.clear();

        let n = df.height();

        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;
            let ca = column.str().map_err(|e| {
                ScorecastError::Transform(format!("column '{col_name}' is not categorical: {e}"))
            })?;

            let mut cats: Vec<String> = Vec::new();
            let mut counts: Vec<usize> = Vec::new();
            for value in ca.into_iter().flatten() {
                match cats.iter().position(|c| c == value) {
                    Some(idx) => counts[idx] += 1,
                    None => {
                        cats.push(value.to_string());
                        counts.push(1);
                    }
                }
            }

            // Sorted category order keeps the output layout deterministic
            let mut pairs: Vec<(String, usize)> = cats.into_iter().zip(counts).collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));

            for (_, count) in &pairs {
                self.scales.push(indicator_std(*count, n));
            }
            self.categories
                .push((col_name.clone(), pairs.into_iter().map(|(c, _)| c).collect()));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Encode the categorical columns into a dense indicator matrix.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let n_rows = df.height();
        let n_out = self.output_width();
        let mut out = Array2::zeros((n_rows, n_out));

        let mut offset = 0;
        for (col_name, cats) in &self.categories {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;
            let ca = column.str().map_err(|e| {
                ScorecastError::Transform(format!("column '{col_name}' is not categorical: {e}"))
            })?;

            for (row, value) in ca.into_iter().enumerate() {
                // Unseen categories (and nulls that escaped imputation) leave
                // the whole block at zero rather than erroring.
                if let Some(value) = value {
                    if let Some(idx) = cats.iter().position(|c| c == value) {
                        let col = offset + idx;
                        out[[row, col]] = 1.0 / self.scales[col];
                    }
                }
            }

            offset += cats.len();
        }

        Ok(out)
    }

    /// Total number of indicator columns produced
    pub fn output_width(&self) -> usize {
        self.categories.iter().map(|(_, cats)| cats.len()).sum()
    }

    /// Output column names: `<column>_<category>` in output order
    pub fn output_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{col}_{c}")))
            .collect()
    }
}

/// Sample standard deviation of a 0/1 indicator with `count` ones in `n` rows.
fn indicator_std(count: usize, n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    let p = count as f64 / n as f64;
    let var = (count as f64 * (1.0 - p).powi(2) + (n - count) as f64 * p.powi(2))
        / (n as f64 - 1.0);
    let std = var.sqrt();
    if std == 0.0 {
        1.0
    } else {
        std
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_layout() {
        let df = df!("lunch" => &["standard", "free", "standard", "free"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &["lunch".to_string()]).unwrap();

        assert_eq!(encoder.output_width(), 2);
        assert_eq!(encoder.output_names(), vec!["lunch_free", "lunch_standard"]);

        let out = encoder.transform(&df).unwrap();
        // Row 0 is "standard": zero in the "free" slot, nonzero in "standard"
        assert_eq!(out[[0, 0]], 0.0);
        assert!(out[[0, 1]] > 0.0);
    }

    #[test]
    fn test_unseen_category_is_all_zeros() {
        let train = df!("gender" => &["female", "male", "female"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&train, &["gender".to_string()]).unwrap();

        let test = df!("gender" => &["other"]).unwrap();
        let out = encoder.transform(&test).unwrap();
        assert!(out.row(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_category_column() {
        let df = df!("flag" => &["yes", "yes", "yes"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &["flag".to_string()]).unwrap();

        // Zero-variance indicator falls back to scale 1
        let out = encoder.transform(&df).unwrap();
        assert_eq!(out[[0, 0]], 1.0);
    }
}
