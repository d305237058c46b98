//! Application State
//!
//! Shared host-side state: the configuration service and the pipeline
//! controller, each behind an async lock so concurrent host calls are
//! serialized.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use rag_pipeline_llm::Message;

use crate::models::settings::{PipelineSettings, SettingsUpdate};
use crate::services::knowledge::{
    Backends, HealthReport, PipelineError, PipelineState, QueryResult, RagPipeline,
};
use crate::storage::ConfigService;
use crate::utils::error::AppResult;

/// Application state shared by every host entry point
#[derive(Clone)]
pub struct AppState {
    /// Configuration service for pipeline settings
    config: Arc<RwLock<ConfigService>>,
    /// The pipeline controller
    pipeline: Arc<Mutex<RagPipeline>>,
}

impl AppState {
    /// Wire a pipeline to the settings held by `config`. Builds eagerly when
    /// `eager_initialize` is set.
    pub async fn new(config: ConfigService, backends: Backends) -> Result<Self, PipelineError> {
        let pipeline = RagPipeline::create(config.get_config_clone(), backends).await?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            pipeline: Arc::new(Mutex::new(pipeline)),
        })
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> PipelineSettings {
        self.config.read().await.get_config_clone()
    }

    /// Current pipeline state
    pub async fn pipeline_state(&self) -> PipelineState {
        self.pipeline.lock().await.state()
    }

    /// Backend health of the served index
    pub async fn health(&self) -> HealthReport {
        self.pipeline.lock().await.health().await
    }

    /// Host startup hook
    pub async fn startup(&self) -> Result<PipelineState, PipelineError> {
        self.pipeline.lock().await.startup().await
    }

    /// Host shutdown hook. Logs completion only.
    pub async fn shutdown(&self) {
        self.pipeline.lock().await.shutdown().await;
    }

    /// Persist a settings update, then hand the new settings to the pipeline.
    ///
    /// A rejected update changes nothing. A rebuild failure is returned after
    /// the settings were saved.
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<PipelineState> {
        let settings = self.config.write().await.update_config(update)?;
        let state = self
            .pipeline
            .lock()
            .await
            .on_configuration_updated(settings)
            .await?;
        Ok(state)
    }

    /// Answer a host message
    pub async fn answer(
        &self,
        user_message: &str,
        model_id: &str,
        messages: &[Message],
        body: &serde_json::Value,
    ) -> QueryResult {
        self.pipeline
            .lock()
            .await
            .answer(user_message, model_id, messages, body)
            .await
    }
}
