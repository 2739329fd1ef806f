//! Error types for the server

use crate::error::ScorecastError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] ScorecastError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Classify on the root cause so stage wrappers don't hide it
            ServerError::Pipeline(err) => match err.root_cause() {
                ScorecastError::Data(msg) | ScorecastError::Transform(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                ScorecastError::ArtifactNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "No trained model available. Run training first.".to_string(),
                ),
                gate @ ScorecastError::QualityGate { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, gate.to_string())
                }
                other => {
                    tracing::error!(detail = %other, "pipeline error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Pipeline failed. Check server logs for details.".to_string(),
                    )
                }
            },
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use axum::response::IntoResponse;

    #[test]
    fn test_missing_artifacts_map_to_not_found() {
        let err = ServerError::Pipeline(ScorecastError::ArtifactNotFound("model.json".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_gate_failure_maps_to_unprocessable() {
        let err = ServerError::Pipeline(
            ScorecastError::QualityGate {
                best: 0.5,
                threshold: 0.7,
            }
            .at(Stage::Gate),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_data_error_maps_to_bad_request() {
        let err = ServerError::Pipeline(ScorecastError::Data("bad csv".into()).at(Stage::Ingest));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
