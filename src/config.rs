//! Pipeline configuration
//!
//! Each training run receives its own [`PipelineConfig`] instance instead of
//! relying on process-wide state. Artifact locations are derived from a single
//! artifacts directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum held-out R² a winning model must reach before it is persisted.
/// Fixed policy constant, not user-configurable.
pub const QUALITY_GATE: f64 = 0.70;

/// Configuration context passed down to every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory where all run artifacts are written
    pub artifacts_dir: PathBuf,
    /// Fraction of rows held out for the test split
    pub test_split: f64,
    /// Seed for the train/test shuffle and all downstream randomness
    pub random_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts_output"),
            test_split: 0.2,
            random_seed: 38,
        }
    }
}

impl PipelineConfig {
    /// Create a config rooted at a custom artifacts directory
    pub fn with_artifacts_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifacts_dir.join("preprocessor.json")
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join("model.json")
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.artifacts_dir.join("data.csv")
    }

    pub fn train_data_path(&self) -> PathBuf {
        self.artifacts_dir.join("train.csv")
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.artifacts_dir.join("test.csv")
    }

    /// Ensure the artifacts directory exists
    pub fn ensure_artifacts_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.artifacts_dir)
    }

    /// True if both persisted artifacts are present
    pub fn artifacts_exist(&self) -> bool {
        self.preprocessor_path().exists() && self.model_path().exists()
    }

    /// Helper for paths in error messages
    pub fn display_path(path: &Path) -> String {
        path.display().to_string()
    }
}
