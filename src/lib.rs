//! Scorecast - student performance regression workflow
//!
//! An end-to-end tabular regression pipeline: CSV ingestion with a seeded
//! train/test split, a two-branch preprocessing transform (numeric
//! impute/scale, categorical impute/encode), multi-model training with
//! cross-validated grid search, best-model selection behind a quality gate,
//! artifact persistence, and a prediction service with a thin web interface.
//!
//! # Modules
//!
//! - [`ingestion`] - CSV loading and the seeded train/test split
//! - [`transform`] - Imputation, scaling, encoding, and the composed preprocessor
//! - [`models`] - Candidate regressors and the roster definition
//! - [`evaluation`] - Cross-validated grid search and held-out scoring
//! - [`trainer`] - The end-to-end training workflows
//! - [`predict`] - Prediction service over persisted artifacts
//! - [`server`] - Web interface
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod ingestion;
pub mod models;
pub mod predict;
pub mod server;
pub mod trainer;
pub mod transform;

pub use config::{PipelineConfig, QUALITY_GATE};
pub use error::{Result, ScorecastError, Stage};
pub use predict::{PredictionService, StudentRecord};
pub use trainer::{ModelTrainer, TrainPipeline, TrainingSummary};
