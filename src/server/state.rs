//! Application state management

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::predict::PredictionService;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared across handlers.
///
/// The prediction service is loaded lazily from disk on first use and cached;
/// a training run invalidates the cache so the next request picks up the new
/// artifacts.
pub struct AppState {
    pub pipeline: PipelineConfig,
    service: RwLock<Option<Arc<PredictionService>>>,
}

impl AppState {
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self {
            pipeline,
            service: RwLock::new(None),
        }
    }

    /// Cached prediction service, loading artifacts on first access.
    pub async fn service(&self) -> Result<Arc<PredictionService>> {
        if let Some(service) = self.service.read().await.as_ref() {
            return Ok(Arc::clone(service));
        }

        let mut slot = self.service.write().await;
        // Another task may have loaded it while we waited for the write lock
        if let Some(service) = slot.as_ref() {
            return Ok(Arc::clone(service));
        }

        let service = Arc::new(PredictionService::load(&self.pipeline)?);
        *slot = Some(Arc::clone(&service));
        Ok(service)
    }

    /// Drop the cached service so new artifacts are picked up.
    pub async fn invalidate_service(&self) {
        *self.service.write().await = None;
    }
}
