//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::predict::StudentRecord;
use crate::trainer::ModelTrainer;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Landing page
pub async fn index() -> Html<String> {
    Html(page(
        "Student Performance Predictor",
        r#"<p>Predict a student's math score from demographics and test results.</p>
           <p><a href="/predict">Open the prediction form</a></p>"#,
    ))
}

/// Empty prediction form
pub async fn predict_form() -> Html<String> {
    Html(page("Predict Math Score", &form_html(None)))
}

/// Handle a submitted prediction form
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Form(record): Form<StudentRecord>,
) -> Result<Html<String>> {
    validate_record(&record)?;

    let service = state.service().await?;
    let prediction = service.predict(&record)?;
    info!(prediction, "form prediction served");

    let result = format!(
        r#"<div class="result">Predicted math score: <strong>{prediction:.2}</strong></div>"#
    );
    Ok(Html(page("Predict Math Score", &form_html(Some(&result)))))
}

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub data_path: String,
}

/// Run the training workflow on a server-local CSV path. Training is CPU
/// bound, so it runs on the blocking pool.
pub async fn train(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<serde_json::Value>> {
    let config = state.pipeline.clone();
    let data_path = std::path::PathBuf::from(request.data_path);

    let summary = tokio::task::spawn_blocking(move || {
        ModelTrainer::new(config).run(&data_path)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("training task panicked: {e}")))??;

    state.invalidate_service().await;
    info!(
        best_model = %summary.best_model,
        best_score = summary.best_score,
        "training run completed via api"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "best_model": summary.best_model,
        "best_score": summary.best_score,
    })))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn validate_record(record: &StudentRecord) -> Result<()> {
    for (name, value) in [
        ("reading_score", record.reading_score),
        ("writing_score", record.writing_score),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ServerError::BadRequest(format!(
                "{name} must be between 0 and 100"
            )));
        }
    }
    Ok(())
}

/// Wrap page content in the shared shell. The UI is embedded for portability.
fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; max-width: 640px; margin: 2rem auto; padding: 0 1rem; color: #222; }}
        label {{ display: block; margin-top: 0.75rem; font-weight: 600; }}
        input, select {{ width: 100%; padding: 0.4rem; margin-top: 0.25rem; }}
        button {{ margin-top: 1rem; padding: 0.5rem 1.5rem; }}
        .result {{ margin-top: 1rem; padding: 1rem; background: #e8f4e8; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    {body}
</body>
</html>"#
    )
}

fn form_html(result: Option<&str>) -> String {
    let mut html = String::from(
        r#"<form method="post" action="/predict">
        <label>Gender
            <select name="gender">
                <option value="female">female</option>
                <option value="male">male</option>
            </select>
        </label>
        <label>Race or Ethnicity
            <select name="race_ethnicity">
                <option value="group A">group A</option>
                <option value="group B">group B</option>
                <option value="group C">group C</option>
                <option value="group D">group D</option>
                <option value="group E">group E</option>
            </select>
        </label>
        <label>Parental Level of Education
            <select name="parental_level_of_education">
                <option value="some high school">some high school</option>
                <option value="high school">high school</option>
                <option value="some college">some college</option>
                <option value="associate's degree">associate's degree</option>
                <option value="bachelor's degree">bachelor's degree</option>
                <option value="master's degree">master's degree</option>
            </select>
        </label>
        <label>Lunch
            <select name="lunch">
                <option value="standard">standard</option>
                <option value="free/reduced">free/reduced</option>
            </select>
        </label>
        <label>Test Preparation Course
            <select name="test_preparation_course">
                <option value="none">none</option>
                <option value="completed">completed</option>
            </select>
        </label>
        <label>Reading Score
            <input type="number" name="reading_score" min="0" max="100" step="1" required>
        </label>
        <label>Writing Score
            <input type="number" name="writing_score" min="0" max="100" step="1" required>
        </label>
        <button type="submit">Predict</button>
    </form>"#,
    );
    if let Some(result) = result {
        html.push_str(result);
    }
    html
}
