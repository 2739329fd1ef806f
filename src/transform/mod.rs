//! Feature transformation: imputation, scaling, encoding, and the composed
//! preprocessor that turns a raw DataFrame into a fixed-width feature matrix.

mod encoder;
mod imputer;
mod preprocessor;
mod scaler;

pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use preprocessor::Preprocessor;
pub use scaler::Scaler;

use crate::error::{Result, ScorecastError};
use ndarray::Array2;
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Columns that cannot be represented numerically are a transform error.
pub(crate) fn columns_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df.column(col_name).map_err(|_| {
                ScorecastError::Transform(format!("required column missing: {col_name}"))
            })?;

            if column.dtype() == &DataType::String {
                return Err(ScorecastError::Transform(format!(
                    "column '{col_name}' is not numeric (dtype {})",
                    column.dtype()
                )));
            }

            let casted = column.cast(&DataType::Float64).map_err(|e| {
                ScorecastError::Transform(format!("column '{col_name}' cast failed: {e}"))
            })?;
            let values: Vec<f64> = casted
                .f64()
                .map_err(|e| ScorecastError::Transform(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}
