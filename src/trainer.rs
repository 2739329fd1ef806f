//! End-to-end training workflows
//!
//! [`ModelTrainer`] is the canonical pipeline: ingest, fit the composed
//! preprocessor, tune and evaluate the full roster, gate on held-out R², and
//! persist the winning artifacts. [`TrainPipeline`] is the reduced all-numeric
//! variant that standardizes features and trains the four mandatory
//! regressors with default configuration.
//!
//! Artifacts are only written after the quality gate passes; a gated-out run
//! leaves the artifacts directory free of model files.

use crate::config::{PipelineConfig, QUALITY_GATE};
use crate::error::{Result, ScorecastError, Stage};
use crate::evaluation::{evaluate_models, EvaluatedModel, EvaluationReport};
use crate::ingestion::{read_csv, train_test_split, DataIngestion};
use crate::models::{default_roster, reduced_roster, ModelCandidate};
use crate::transform::{columns_to_matrix, Preprocessor, Scaler};
use ndarray::Array1;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Target column predicted by the canonical student performance workflow
pub const TARGET_COLUMN: &str = "math_score";

/// Outcome of a successful training run
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainingSummary {
    pub best_model: String,
    pub best_score: f64,
}

/// Canonical training workflow over the student performance schema.
pub struct ModelTrainer {
    config: PipelineConfig,
    roster: Vec<ModelCandidate>,
}

impl ModelTrainer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            roster: default_roster(),
        }
    }

    /// Replace the candidate roster, mainly for tests and experiments.
    pub fn with_roster(mut self, roster: Vec<ModelCandidate>) -> Self {
        self.roster = roster;
        self
    }

    /// Run the full workflow on the CSV at `data_path`.
    pub fn run(&self, data_path: &Path) -> Result<TrainingSummary> {
        let (train_df, test_df) = DataIngestion::new(&self.config)
            .ingest(data_path)
            .map_err(|e| e.at(Stage::Ingest))?;

        let (x_train, y_train, x_test, y_test, preprocessor) = (|| {
            let y_train = extract_target(&train_df, TARGET_COLUMN)?;
            let y_test = extract_target(&test_df, TARGET_COLUMN)?;

            let mut preprocessor = Preprocessor::student_performance();
            let x_train = preprocessor.fit_transform(&train_df)?;
            let x_test = preprocessor.transform(&test_df)?;
            Ok((x_train, y_train, x_test, y_test, preprocessor))
        })()
        .map_err(|e: ScorecastError| e.at(Stage::Transform))?;

        info!(
            train_rows = x_train.nrows(),
            features = x_train.ncols(),
            candidates = self.roster.len(),
            "starting model evaluation"
        );

        let report = evaluate_models(
            &x_train,
            &y_train,
            &x_test,
            &y_test,
            &self.roster,
            self.config.random_seed,
        )
        .map_err(|e| e.at(Stage::Evaluate))?;

        let best = select_best(&report).map_err(|e| e.at(Stage::SelectBest))?;
        enforce_gate(best).map_err(|e| e.at(Stage::Gate))?;

        (|| {
            preprocessor.save(&self.config.preprocessor_path())?;
            best.model.save(&self.config.model_path())?;
            Ok(())
        })()
        .map_err(|e: ScorecastError| e.at(Stage::Persist))?;

        info!(
            best_model = best.name,
            best_score = best.test_r2,
            "training complete, artifacts persisted"
        );

        Ok(TrainingSummary {
            best_model: best.name.to_string(),
            best_score: best.test_r2,
        })
    }
}

/// Reduced workflow: every feature is numeric, standardized with a plain
/// scaler, and the four mandatory regressors run with default configuration.
pub struct TrainPipeline {
    config: PipelineConfig,
    target_column: String,
}

impl TrainPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            target_column: "target_column".to_string(),
        }
    }

    pub fn with_target_column(mut self, target_column: impl Into<String>) -> Self {
        self.target_column = target_column.into();
        self
    }

    pub fn run(&self, data_path: &Path) -> Result<TrainingSummary> {
        let (train_df, test_df) = (|| {
            let df = read_csv(data_path)?;
            train_test_split(&df, self.config.test_split, self.config.random_seed)
        })()
        .map_err(|e| e.at(Stage::Ingest))?;

        let (x_train, y_train, x_test, y_test, scaler) = (|| {
            let y_train = extract_target(&train_df, &self.target_column)?;
            let y_test = extract_target(&test_df, &self.target_column)?;

            let feature_columns: Vec<String> = train_df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .filter(|name| name != &self.target_column)
                .collect();

            let mut scaler = Scaler::new();
            let scaled_train = scaler.fit_transform(&train_df, &feature_columns)?;
            let scaled_test = scaler.transform(&test_df)?;

            let x_train = columns_to_matrix(&scaled_train, &feature_columns)?;
            let x_test = columns_to_matrix(&scaled_test, &feature_columns)?;
            Ok((x_train, y_train, x_test, y_test, scaler))
        })()
        .map_err(|e: ScorecastError| e.at(Stage::Transform))?;

        let report = evaluate_models(
            &x_train,
            &y_train,
            &x_test,
            &y_test,
            &reduced_roster(),
            self.config.random_seed,
        )
        .map_err(|e| e.at(Stage::Evaluate))?;

        let best = select_best(&report).map_err(|e| e.at(Stage::SelectBest))?;
        enforce_gate(best).map_err(|e| e.at(Stage::Gate))?;

        (|| {
            self.config.ensure_artifacts_dir()?;
            let json = serde_json::to_string(&scaler)?;
            std::fs::write(self.config.preprocessor_path(), json)?;
            best.model.save(&self.config.model_path())?;
            Ok(())
        })()
        .map_err(|e: ScorecastError| e.at(Stage::Persist))?;

        Ok(TrainingSummary {
            best_model: best.name.to_string(),
            best_score: best.test_r2,
        })
    }
}

/// Pull the target column out of the table as a dense vector. Nulls in the
/// target are a data error rather than silently imputed.
pub(crate) fn extract_target(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let column = df.column(target).map_err(|_| {
        ScorecastError::Data(format!("target column missing: {target}"))
    })?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|_| ScorecastError::Data(format!("target column is not numeric: {target}")))?;
    let ca = casted
        .f64()
        .map_err(|e| ScorecastError::Data(e.to_string()))?;

    if ca.null_count() > 0 {
        return Err(ScorecastError::Data(format!(
            "target column contains {} missing values: {target}",
            ca.null_count()
        )));
    }

    Ok(ca.into_no_null_iter().collect())
}

fn select_best(report: &EvaluationReport) -> Result<&EvaluatedModel> {
    report
        .best()
        .ok_or_else(|| ScorecastError::Training("no evaluated candidates".to_string()))
}

fn enforce_gate(best: &EvaluatedModel) -> Result<()> {
    if best.test_r2 < QUALITY_GATE {
        return Err(ScorecastError::QualityGate {
            best: best.test_r2,
            threshold: QUALITY_GATE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    #[test]
    fn test_extract_target() {
        let df = df!("math_score" => &[70.0, 80.0], "other" => &[1.0, 2.0]).unwrap();
        let y = extract_target(&df, "math_score").unwrap();
        assert_eq!(y.len(), 2);
        assert_eq!(y[0], 70.0);
    }

    #[test]
    fn test_extract_target_missing_column() {
        let df = df!("a" => &[1.0]).unwrap();
        let err = extract_target(&df, "math_score").unwrap_err();
        assert!(matches!(err, ScorecastError::Data(_)));
    }

    #[test]
    fn test_extract_target_rejects_nulls() {
        let df = df!("math_score" => &[Some(70.0), None]).unwrap();
        let err = extract_target(&df, "math_score").unwrap_err();
        assert!(matches!(err, ScorecastError::Data(_)));
    }

    #[test]
    fn test_gate_rejects_below_threshold() {
        let entry = dummy_entry(0.69);
        let err = enforce_gate(&entry).unwrap_err();
        match err {
            ScorecastError::QualityGate { best, threshold } => {
                assert_eq!(best, 0.69);
                assert_eq!(threshold, QUALITY_GATE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gate_accepts_at_threshold() {
        assert!(enforce_gate(&dummy_entry(0.70)).is_ok());
    }

    fn dummy_entry(score: f64) -> EvaluatedModel {
        let candidate = ModelCandidate::new("dummy", ModelKind::LinearRegression);
        let mut model = candidate.build(&Default::default());
        let x = ndarray::array![[1.0], [2.0], [3.0]];
        let y = ndarray::array![1.0, 2.0, 3.0];
        model.fit(&x, &y).unwrap();
        EvaluatedModel {
            name: "dummy",
            test_r2: score,
            train_r2: score,
            model,
            params: Default::default(),
        }
    }
}
