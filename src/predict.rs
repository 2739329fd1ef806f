//! Prediction service over persisted artifacts

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::TrainedModel;
use crate::transform::Preprocessor;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One inference request over the student performance schema. Field names
/// match the training CSV header so a record maps 1:1 onto a data row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    pub reading_score: f64,
    pub writing_score: f64,
}

impl StudentRecord {
    /// Single-row DataFrame with the training schema minus the target.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(df!(
            "gender" => &[self.gender.as_str()],
            "race_ethnicity" => &[self.race_ethnicity.as_str()],
            "parental_level_of_education" => &[self.parental_level_of_education.as_str()],
            "lunch" => &[self.lunch.as_str()],
            "test_preparation_course" => &[self.test_preparation_course.as_str()],
            "reading_score" => &[self.reading_score],
            "writing_score" => &[self.writing_score]
        )?)
    }
}

/// Loads the persisted preprocessor and model once and serves predictions.
///
/// Loading fails with `ArtifactNotFound` until a training run has cleared
/// the quality gate and written both artifacts.
#[derive(Debug)]
pub struct PredictionService {
    preprocessor: Preprocessor,
    model: TrainedModel,
}

impl PredictionService {
    /// Load both artifacts from the configured paths.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let preprocessor = Preprocessor::load(&config.preprocessor_path())?;
        let model = TrainedModel::load(&config.model_path())?;
        Ok(Self {
            preprocessor,
            model,
        })
    }

    /// Predict the target score for a single record.
    pub fn predict(&self, record: &StudentRecord) -> Result<f64> {
        let df = record.to_dataframe()?;
        let features = self.preprocessor.transform(&df)?;
        let prediction = self.model.predict(&features)?;
        let value = prediction[0];
        debug!(prediction = value, "record scored");
        Ok(value)
    }

    /// Predict a batch of records in one pass.
    pub fn predict_batch(&self, records: &[StudentRecord]) -> Result<Vec<f64>> {
        records.iter().map(|r| self.predict(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScorecastError;

    fn sample_record() -> StudentRecord {
        StudentRecord {
            gender: "female".to_string(),
            race_ethnicity: "group B".to_string(),
            parental_level_of_education: "bachelor's degree".to_string(),
            lunch: "standard".to_string(),
            test_preparation_course: "none".to_string(),
            reading_score: 72.0,
            writing_score: 74.0,
        }
    }

    #[test]
    fn test_record_to_dataframe_schema() {
        let df = sample_record().to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 7);
        assert!(df.column("reading_score").is_ok());
        assert!(df.column("math_score").is_err());
    }

    #[test]
    fn test_load_without_artifacts_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::with_artifacts_dir(dir.path());
        let err = PredictionService::load(&config).unwrap_err();
        assert!(matches!(err, ScorecastError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_record_deserializes_from_form_style_json() {
        let json = r#"{
            "gender": "male",
            "race_ethnicity": "group C",
            "parental_level_of_education": "high school",
            "lunch": "free/reduced",
            "test_preparation_course": "completed",
            "reading_score": 55,
            "writing_score": 60
        }"#;
        let record: StudentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.reading_score, 55.0);
    }
}
