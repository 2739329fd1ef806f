//! Web interface for the student performance workflow
//!
//! Serves a small HTML form for single-record predictions plus JSON
//! endpoints to trigger training and check service health.

mod error;
mod handlers;
mod state;

pub use error::ServerError;
pub use state::AppState;

use crate::config::PipelineConfig;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server bind configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Build the application router over a pipeline configuration.
pub fn create_router(pipeline: PipelineConfig) -> Router {
    let state = Arc::new(AppState::new(pipeline));

    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", get(handlers::predict_form))
        .route("/predict", post(handlers::predict))
        .route("/train", post(handlers::train))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig, pipeline: PipelineConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    let app = create_router(pipeline);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        started_at = %start_time.to_rfc3339(),
        "server listening"
    );
    info!(url = %format!("http://{}/predict", addr), "prediction form available");

    let shutdown_signal = async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let uptime = chrono::Utc::now().signed_duration_since(start_time);
            info!(
                uptime_secs = uptime.num_seconds(),
                "shutdown signal received, stopping server gracefully"
            );
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
    }
}
