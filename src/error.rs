//! Error types for the scorecast pipeline

use thiserror::Error;

/// Result type alias for scorecast operations
pub type Result<T> = std::result::Result<T, ScorecastError>;

/// Pipeline stages, used to tag where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Ingest,
    Transform,
    Evaluate,
    SelectBest,
    Gate,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Transform => "transform",
            Stage::Evaluate => "evaluate",
            Stage::SelectBest => "select-best",
            Stage::Gate => "gate",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Main error type for the scorecast workflow
#[derive(Error, Debug)]
pub enum ScorecastError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("No candidate cleared the quality gate: best score {best:.4} is below {threshold}")]
    QualityGate { best: f64, threshold: f64 },

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<ScorecastError>,
    },
}

impl ScorecastError {
    /// Tag this error with the stage it originated from. Errors already
    /// carrying a stage tag are returned unchanged so nested helpers
    /// don't stack wrappers.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            err @ ScorecastError::Stage { .. } => err,
            other => ScorecastError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Strip stage wrappers and return the root cause.
    pub fn root_cause(&self) -> &ScorecastError {
        match self {
            ScorecastError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The stage tag, if this error carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ScorecastError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<polars::error::PolarsError> for ScorecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScorecastError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for ScorecastError {
    fn from(err: serde_json::Error) -> Self {
        ScorecastError::ArtifactLoad(err.to_string())
    }
}
