//! Composed feature preprocessor
//!
//! Mirrors the two-branch column transform of the training workflow: numeric
//! columns are median-imputed then standardized, categorical columns are
//! mode-imputed, one-hot encoded, then scaled without centering. The fitted
//! object is serialized to JSON and reused unchanged at inference time.

use super::{columns_to_matrix, ImputeStrategy, Imputer, OneHotEncoder, Scaler};
use crate::error::{Result, ScorecastError};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    numeric_scaler: Scaler,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl Preprocessor {
    /// Build an unfitted preprocessor from disjoint numeric and categorical
    /// column declarations.
    pub fn new(numeric_columns: Vec<String>, categorical_columns: Vec<String>) -> Self {
        Self {
            numeric_columns,
            categorical_columns,
            numeric_imputer: Imputer::new(ImputeStrategy::Median),
            categorical_imputer: Imputer::new(ImputeStrategy::Mode),
            numeric_scaler: Scaler::new(),
            encoder: OneHotEncoder::new(),
            is_fitted: false,
        }
    }

    /// Column declarations for the student performance dataset.
    pub fn student_performance() -> Self {
        Self::new(
            vec!["reading_score".to_string(), "writing_score".to_string()],
            vec![
                "gender".to_string(),
                "race_ethnicity".to_string(),
                "parental_level_of_education".to_string(),
                "lunch".to_string(),
                "test_preparation_course".to_string(),
            ],
        )
    }

    /// Fit all stages on the training table. Must be called exactly once;
    /// test and inference data go through [`Preprocessor::transform`] only.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if !self.numeric_columns.is_empty() {
            self.numeric_imputer.fit(df, &self.numeric_columns)?;
            let imputed = self.numeric_imputer.transform(df)?;
            self.numeric_scaler.fit(&imputed, &self.numeric_columns)?;
        }

        if !self.categorical_columns.is_empty() {
            self.categorical_imputer.fit(df, &self.categorical_columns)?;
            let imputed = self.categorical_imputer.transform(df)?;
            self.encoder.fit(&imputed, &self.categorical_columns)?;
        }

        self.is_fitted = true;
        debug!(
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            output_width = self.output_width(),
            "preprocessor fitted"
        );
        Ok(self)
    }

    /// Apply the fitted transform. Output column order is all numeric-pipeline
    /// outputs followed by all categorical-pipeline outputs.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ScorecastError::NotFitted);
        }

        let numeric = if self.numeric_columns.is_empty() {
            Array2::zeros((df.height(), 0))
        } else {
            let imputed = self.numeric_imputer.transform(df)?;
            let scaled = self.numeric_scaler.transform(&imputed)?;
            columns_to_matrix(&scaled, &self.numeric_columns)?
        };

        let categorical = if self.categorical_columns.is_empty() {
            Array2::zeros((df.height(), 0))
        } else {
            let imputed = self.categorical_imputer.transform(df)?;
            self.encoder.transform(&imputed)?
        };

        concatenate(Axis(1), &[numeric.view(), categorical.view()])
            .map_err(|e| ScorecastError::Transform(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    pub fn output_width(&self) -> usize {
        self.numeric_columns.len() + self.encoder.output_width()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Persist the fitted preprocessor as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously persisted preprocessor.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScorecastError::ArtifactNotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        let preprocessor: Self = serde_json::from_str(&json)
            .map_err(|e| ScorecastError::ArtifactLoad(format!("{}: {e}", path.display())))?;
        Ok(preprocessor)
    }
}
