//! Feature scaling

use crate::error::{Result, ScorecastError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-column fitted scaling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,
    scale: f64,
}

/// Standard scaler over named DataFrame columns.
///
/// `with_mean(false)` reproduces scaling without mean-centering (used for
/// sparse one-hot output in the reduced pipeline paths).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    with_mean: bool,
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scaler {
    pub fn new() -> Self {
        Self {
            with_mean: true,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Fit per-column mean and standard deviation on the training data.
    /// Zero-variance columns get scale 1 so they pass through unchanged.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| ScorecastError::Transform(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| ScorecastError::Transform(e.to_string()))?;

            let mean = if self.with_mean {
                ca.mean().unwrap_or(0.0)
            } else {
                0.0
            };
            let std = ca.std(1).unwrap_or(1.0);

            self.params.insert(
                col_name.clone(),
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df.column(col_name).map_err(|_| {
                    ScorecastError::Transform(format!("required column missing: {col_name}"))
                })?;
                let casted = column
                    .cast(&DataType::Float64)
                    .map_err(|e| ScorecastError::Transform(e.to_string()))?;
                let scaled: Float64Chunked = casted
                    .f64()
                    .map_err(|e| ScorecastError::Transform(e.to_string()))?
                    .into_iter()
                    .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                    .collect();
                Ok(scaled.with_name(col_name.as_str().into()).into_series())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result = result
                .with_column(scaled)
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Column names this scaler was fitted on
    pub fn columns(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }
}
