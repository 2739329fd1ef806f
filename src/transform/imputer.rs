//! Missing value imputation

use crate::error::{Result, ScorecastError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How missing values are filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Fill numeric nulls with the training-set median
    Median,
    /// Fill categorical nulls with the training-set mode
    Mode,
}

/// Column imputer. Fitted fill values are frozen at training time and reused
/// unchanged at transform time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    numeric_fill: HashMap<String, f64>,
    string_fill: HashMap<String, String>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            numeric_fill: HashMap::new(),
            string_fill: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;

            match self.strategy {
                ImputeStrategy::Median => {
                    let casted = column.cast(&DataType::Float64).map_err(|e| {
                        ScorecastError::Transform(format!(
                            "column '{col_name}' is not numeric: {e}"
                        ))
                    })?;
                    let median = casted
                        .f64()
                        .map_err(|e| ScorecastError::Transform(e.to_string()))?
                        .median()
                        .unwrap_or(0.0);
                    self.numeric_fill.insert(col_name.clone(), median);
                }
                ImputeStrategy::Mode => {
                    let ca = column.str().map_err(|e| {
                        ScorecastError::Transform(format!(
                            "column '{col_name}' is not categorical: {e}"
                        ))
                    })?;
                    let mut counts: HashMap<&str, usize> = HashMap::new();
                    for value in ca.into_iter().flatten() {
                        *counts.entry(value).or_insert(0) += 1;
                    }
                    // Deterministic mode: highest count, lexicographic tie-break
                    let mode = counts
                        .into_iter()
                        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
                        .map(|(v, _)| v.to_string())
                        .unwrap_or_default();
                    self.string_fill.insert(col_name.clone(), mode);
                }
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let mut result = df.clone();

        for (col_name, fill) in &self.numeric_fill {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| ScorecastError::Transform(e.to_string()))?;
            let filled = casted
                .f64()
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .fill_null_with_values(*fill)
                .map_err(|e| ScorecastError::Transform(e.to_string()))?;
            result = result
                .with_column(filled.with_name(col_name.as_str().into()).into_series())
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .clone();
        }

        for (col_name, fill) in &self.string_fill {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;
            // polars 0.51 has no ChunkFillNullValue impl for StringChunked,
            // so fill via the binary view and cast back
            let filled = column
                .str()
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .as_binary()
                .fill_null_with_values(fill.as_bytes())
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .into_series()
                .cast(&DataType::String)
                .map_err(|e| ScorecastError::Transform(e.to_string()))?;
            result = result
                .with_column(filled.with_name(col_name.as_str().into()))
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .clone();
        }

        Ok(result)
    }
}
