//! Scripted backends for integration tests.
//!
//! Both factories wrap the real offline providers and consult shared
//! counters to fail a set number of upcoming calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use rag_pipeline::models::settings::PipelineSettings;
use rag_pipeline::services::embedding::{
    create_embedding_provider, EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig,
    EmbeddingProviderType, EmbeddingResult,
};
use rag_pipeline::services::knowledge::{Backends, EmbedderFactory, LlmFactory};
use rag_pipeline_core::streaming::UnifiedStreamEvent;
use rag_pipeline_llm::{
    EventStream, ExtractiveProvider, LlmError, LlmProvider, LlmRequestOptions, LlmResult,
    Message, ProviderConfig, ProviderType,
};

/// Fault budget and call counters shared by the scripted backends.
#[derive(Debug, Default)]
pub struct Faults {
    /// Upcoming `create_llm` calls that fail.
    pub fail_model: AtomicUsize,
    /// Upcoming `create_embedder` calls that fail.
    pub fail_embedder: AtomicUsize,
    /// Upcoming `embed_query` calls that fail.
    pub fail_query_embed: AtomicUsize,
    /// Upcoming `stream_message` calls that fail before a stream exists.
    pub fail_submit: AtomicUsize,
    /// Upcoming `stream_message` calls whose stream breaks after one token.
    pub break_stream: AtomicUsize,
    /// Index build attempts that reached the embedding backend.
    pub builds: AtomicUsize,
    /// `stream_message` calls.
    pub submits: AtomicUsize,
}

impl Faults {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn set(counter: &AtomicUsize, n: usize) {
        counter.store(n, Ordering::SeqCst);
    }
}

/// Consume one unit of a fault budget, if any remains.
fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

struct ScriptedModel {
    inner: ExtractiveProvider,
    faults: Arc<Faults>,
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn config(&self) -> &ProviderConfig {
        self.inner.config()
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<EventStream> {
        self.faults.submits.fetch_add(1, Ordering::SeqCst);
        if take(&self.faults.fail_submit) {
            return Err(LlmError::NetworkError {
                message: "connection refused".to_string(),
            });
        }
        if take(&self.faults.break_stream) {
            let events = vec![
                UnifiedStreamEvent::text("The "),
                UnifiedStreamEvent::error("connection reset"),
                UnifiedStreamEvent::text("capital"),
            ];
            return Ok(stream::iter(events).boxed());
        }
        self.inner
            .stream_message(messages, system, request_options)
            .await
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}

struct ScriptedLlmFactory(Arc<Faults>);

impl LlmFactory for ScriptedLlmFactory {
    fn create_llm(&self, config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
        if take(&self.0.fail_model) {
            return Err(LlmError::ProviderUnavailable {
                message: "model backend offline".to_string(),
            });
        }
        Ok(Arc::new(ScriptedModel {
            inner: ExtractiveProvider::new(config.clone()),
            faults: self.0.clone(),
        }))
    }
}

struct ScriptedEmbedder {
    inner: Box<dyn EmbeddingProvider>,
    faults: Arc<Faults>,
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    async fn prepare(&mut self, corpus: &[&str]) -> EmbeddingResult<()> {
        self.inner.prepare(corpus).await
    }

    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.inner.embed_documents(documents).await
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        if take(&self.faults.fail_query_embed) {
            return Err(EmbeddingError::NetworkError {
                message: "embedding endpoint timed out".to_string(),
            });
        }
        self.inner.embed_query(query).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        self.inner.health_check().await
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        self.inner.provider_type()
    }

    fn display_name(&self) -> &str {
        self.inner.display_name()
    }
}

struct ScriptedEmbedderFactory(Arc<Faults>);

impl EmbedderFactory for ScriptedEmbedderFactory {
    fn create_embedder(
        &self,
        config: &EmbeddingProviderConfig,
    ) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
        self.0.builds.fetch_add(1, Ordering::SeqCst);
        if take(&self.0.fail_embedder) {
            return Err(EmbeddingError::ProviderUnavailable {
                message: "embedding backend offline".to_string(),
            });
        }
        Ok(Box::new(ScriptedEmbedder {
            inner: create_embedding_provider(config)?,
            faults: self.0.clone(),
        }))
    }
}

/// Backends wired to a fresh fault budget.
pub fn scripted_backends() -> (Backends, Arc<Faults>) {
    let faults = Arc::new(Faults::default());
    let backends = Backends::new(
        Arc::new(ScriptedLlmFactory(faults.clone())),
        Arc::new(ScriptedEmbedderFactory(faults.clone())),
    );
    (backends, faults)
}

/// Default settings answering with the offline extractive model.
pub fn offline_settings() -> PipelineSettings {
    PipelineSettings {
        llm: ProviderConfig::for_provider(ProviderType::Extractive),
        ..Default::default()
    }
}

pub fn settings_with_seed(seed: &str) -> PipelineSettings {
    PipelineSettings {
        seed_text: seed.to_string(),
        ..offline_settings()
    }
}
