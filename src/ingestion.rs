//! Dataset ingestion
//!
//! Reads the raw CSV, keeps a copy under the artifacts directory, and produces
//! a seeded train/test split. The split CSVs are persisted alongside the raw
//! copy so a run can be inspected after the fact.

use crate::config::PipelineConfig;
use crate::error::{Result, ScorecastError};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::info;

pub struct DataIngestion<'a> {
    config: &'a PipelineConfig,
}

impl<'a> DataIngestion<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Load the dataset, persist raw/train/test copies, and return the split.
    pub fn ingest(&self, data_path: &Path) -> Result<(DataFrame, DataFrame)> {
        let df = read_csv(data_path)?;
        info!(
            path = %data_path.display(),
            rows = df.height(),
            columns = df.width(),
            "dataset loaded"
        );

        self.config.ensure_artifacts_dir()?;
        write_csv(&df, &self.config.raw_data_path())?;

        let (train, test) = train_test_split(&df, self.config.test_split, self.config.random_seed)?;
        write_csv(&train, &self.config.train_data_path())?;
        write_csv(&test, &self.config.test_data_path())?;

        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "train/test split persisted"
        );

        Ok((train, test))
    }
}

/// Read a headered CSV into a DataFrame. Unreadable or empty files are a data
/// error.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ScorecastError::Data(format!(
            "dataset path does not exist: {}",
            path.display()
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| ScorecastError::Data(e.to_string()))?
        .finish()
        .map_err(|e| ScorecastError::Data(e.to_string()))?;

    if df.height() == 0 {
        return Err(ScorecastError::Data(format!(
            "dataset is empty: {}",
            path.display()
        )));
    }

    Ok(df)
}

pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .map_err(|e| ScorecastError::Data(e.to_string()))?;
    Ok(())
}

/// Seeded shuffle split. The test set always contains at least one row.
pub fn train_test_split(df: &DataFrame, test_split: f64, seed: u64) -> Result<(DataFrame, DataFrame)> {
    let n = df.height();
    if n < 2 {
        return Err(ScorecastError::Data(format!(
            "need at least 2 rows to split, got {n}"
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((n as f64 * test_split).round() as usize).clamp(1, n - 1);
    let (test_idx, train_idx) = indices.split_at(test_size);

    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx.to_vec()))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx.to_vec()))?;

    Ok((train, test))
}
