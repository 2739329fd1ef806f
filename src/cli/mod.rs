//! Command-line interface for training, prediction, and serving

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::predict::{PredictionService, StudentRecord};
use crate::server::{run_server, ServerConfig};
use crate::trainer::ModelTrainer;

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

#[derive(Parser)]
#[command(name = "scorecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Student performance regression workflow")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train on a CSV dataset and persist the best model
    Train {
        /// Input data file with the student performance schema
        #[arg(short, long)]
        data: PathBuf,

        /// Directory for run artifacts
        #[arg(long, default_value = "artifacts_output")]
        artifacts_dir: PathBuf,
    },

    /// Score a single student record with the persisted model
    Predict {
        #[arg(long)]
        gender: String,
        #[arg(long)]
        race_ethnicity: String,
        #[arg(long)]
        parental_level_of_education: String,
        #[arg(long)]
        lunch: String,
        #[arg(long)]
        test_preparation_course: String,
        #[arg(long)]
        reading_score: f64,
        #[arg(long)]
        writing_score: f64,

        /// Directory holding the persisted artifacts
        #[arg(long, default_value = "artifacts_output")]
        artifacts_dir: PathBuf,
    },

    /// Start the web interface
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(long, default_value = "artifacts_output")]
        artifacts_dir: PathBuf,
    },
}

pub fn cmd_train(data: &PathBuf, artifacts_dir: &PathBuf) -> anyhow::Result<()> {
    section("Training");
    let started = Instant::now();

    let config = PipelineConfig::with_artifacts_dir(artifacts_dir.clone());
    let summary = ModelTrainer::new(config).run(data)?;

    step_ok(&format!(
        "best model: {} (R² = {:.4})",
        summary.best_model.bold(),
        summary.best_score
    ));
    step_ok(&format!("artifacts written to {}", artifacts_dir.display()));
    println!(
        "  {}",
        dim(&format!(
            "completed in {:.1}s",
            started.elapsed().as_secs_f64()
        ))
    );
    Ok(())
}

pub fn cmd_predict(record: StudentRecord, artifacts_dir: &PathBuf) -> anyhow::Result<()> {
    let config = PipelineConfig::with_artifacts_dir(artifacts_dir.clone());
    let service = PredictionService::load(&config)?;
    let prediction = service.predict(&record)?;

    section("Prediction");
    step_ok(&format!(
        "predicted math score: {}",
        format!("{prediction:.2}").bold()
    ));
    Ok(())
}

pub async fn cmd_serve(host: &str, port: u16, artifacts_dir: &PathBuf) -> anyhow::Result<()> {
    let server = ServerConfig {
        host: host.to_string(),
        port,
    };
    let pipeline = PipelineConfig::with_artifacts_dir(artifacts_dir.clone());
    run_server(server, pipeline).await
}
