//! Integration tests for selection, the quality gate, and failure modes

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scorecast::models::{ModelCandidate, ModelKind};
use scorecast::{ModelTrainer, PipelineConfig, ScorecastError, Stage};
use std::path::Path;

/// Dataset whose target is pure noise, so no candidate can clear the gate.
fn write_noise_csv(path: &Path, rows: usize) {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut csv = String::from(
        "gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,math_score,reading_score,writing_score\n",
    );
    for i in 0..rows {
        let gender = if i % 2 == 0 { "female" } else { "male" };
        let reading: f64 = rng.gen_range(30.0..100.0);
        let writing: f64 = rng.gen_range(30.0..100.0);
        let math: f64 = rng.gen_range(0.0..100.0);
        csv.push_str(&format!(
            "{gender},group A,high school,standard,none,{math:.1},{reading:.1},{writing:.1}\n"
        ));
    }
    std::fs::write(path, csv).unwrap();
}

fn linear_only() -> Vec<ModelCandidate> {
    vec![ModelCandidate::new(
        "Linear Regression",
        ModelKind::LinearRegression,
    )]
}

// ============================================================================
// Quality Gate
// ============================================================================

#[test]
fn test_gate_failure_reports_score_and_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("noise.csv");
    write_noise_csv(&data_path, 200);

    let config = PipelineConfig::with_artifacts_dir(dir.path().join("artifacts"));
    let err = ModelTrainer::new(config)
        .with_roster(linear_only())
        .run(&data_path)
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Gate));
    match err.root_cause() {
        ScorecastError::QualityGate { best, threshold } => {
            assert!(*best < 0.70);
            assert_eq!(*threshold, 0.70);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_gate_failure_writes_no_model_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("noise.csv");
    write_noise_csv(&data_path, 200);

    let config = PipelineConfig::with_artifacts_dir(dir.path().join("artifacts"));
    let result = ModelTrainer::new(config.clone())
        .with_roster(linear_only())
        .run(&data_path);

    assert!(result.is_err());
    assert!(!config.preprocessor_path().exists());
    assert!(!config.model_path().exists());
    assert!(!config.artifacts_exist());
}

// ============================================================================
// Failure Modes
// ============================================================================

#[test]
fn test_missing_dataset_fails_at_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::with_artifacts_dir(dir.path().join("artifacts"));

    let err = ModelTrainer::new(config)
        .run(Path::new("/nonexistent/stud.csv"))
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Ingest));
    assert!(matches!(err.root_cause(), ScorecastError::Data(_)));
}

#[test]
fn test_missing_target_column_fails_at_transform() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("no_target.csv");
    // Valid schema except the target column is absent
    let mut csv = String::from(
        "gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,reading_score,writing_score\n",
    );
    for i in 0..20 {
        let gender = if i % 2 == 0 { "female" } else { "male" };
        csv.push_str(&format!("{gender},group A,high school,standard,none,70.0,70.0\n"));
    }
    std::fs::write(&data_path, csv).unwrap();

    let config = PipelineConfig::with_artifacts_dir(dir.path().join("artifacts"));
    let err = ModelTrainer::new(config)
        .with_roster(linear_only())
        .run(&data_path)
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Transform));
    assert!(matches!(err.root_cause(), ScorecastError::Data(_)));
}

#[test]
fn test_empty_roster_fails_at_evaluate() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("noise.csv");
    write_noise_csv(&data_path, 50);

    let config = PipelineConfig::with_artifacts_dir(dir.path().join("artifacts"));
    let err = ModelTrainer::new(config)
        .with_roster(vec![])
        .run(&data_path)
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Evaluate));
    assert!(matches!(err.root_cause(), ScorecastError::Training(_)));
}
