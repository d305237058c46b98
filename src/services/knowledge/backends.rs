//! Backend Factories
//!
//! Seams through which the pipeline obtains its language model and embedding
//! provider. Hosts and tests inject their own implementations; the defaults
//! build the providers shipped in this workspace.

use std::sync::Arc;

use rag_pipeline_llm::{create_provider, LlmProvider, LlmResult, ProviderConfig};

use crate::services::embedding::{
    create_embedding_provider, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingResult,
};

/// Builds the model handle an index answers with.
pub trait LlmFactory: Send + Sync {
    fn create_llm(&self, config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>>;
}

/// Builds a fresh, unprepared embedding provider for one index build.
pub trait EmbedderFactory: Send + Sync {
    fn create_embedder(
        &self,
        config: &EmbeddingProviderConfig,
    ) -> EmbeddingResult<Box<dyn EmbeddingProvider>>;
}

/// Factories backed by the built-in providers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackends;

impl LlmFactory for DefaultBackends {
    fn create_llm(&self, config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
        create_provider(config)
    }
}

impl EmbedderFactory for DefaultBackends {
    fn create_embedder(
        &self,
        config: &EmbeddingProviderConfig,
    ) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
        create_embedding_provider(config)
    }
}

/// The pair of factories a pipeline is wired with.
#[derive(Clone)]
pub struct Backends {
    pub llm: Arc<dyn LlmFactory>,
    pub embedder: Arc<dyn EmbedderFactory>,
}

impl Backends {
    pub fn new(llm: Arc<dyn LlmFactory>, embedder: Arc<dyn EmbedderFactory>) -> Self {
        Self { llm, embedder }
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::new(Arc::new(DefaultBackends), Arc::new(DefaultBackends))
    }
}
