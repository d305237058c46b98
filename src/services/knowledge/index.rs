//! Index Builder
//!
//! Turns a corpus into a [`KnowledgeIndex`]: sentence-packed chunks, their
//! embeddings, the embedding provider that produced them, and the model
//! handle the index answers with.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rag_pipeline_llm::LlmProvider;

use super::backends::EmbedderFactory;
use super::chunker::{Chunk, SentenceChunker};
use super::corpus::Corpus;
use super::error::PipelineError;
use crate::services::embedding::{
    cosine_similarity, EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig,
    EmbeddingResult,
};

/// A chunk matched by a similarity search.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

/// Queryable in-memory index over one corpus.
pub struct KnowledgeIndex {
    id: String,
    corpus: Corpus,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LlmProvider>,
    built_at: DateTime<Utc>,
}

impl KnowledgeIndex {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The language model this index answers with.
    pub fn model(&self) -> &Arc<dyn LlmProvider> {
        &self.model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Embed `query` with the index's own provider.
    pub async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        self.embedder.embed_query(query).await
    }

    /// The `top_k` chunks most similar to `query_embedding`, best first.
    ///
    /// Equal scores keep corpus order.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.embeddings)
            .map(|(chunk, embedding)| ScoredChunk {
                chunk,
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

impl fmt::Debug for KnowledgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeIndex")
            .field("id", &self.id)
            .field("documents", &self.corpus.len())
            .field("chunks", &self.chunks.len())
            .field("embedder", &self.embedder.display_name())
            .field("model", &self.model.model())
            .field("built_at", &self.built_at)
            .finish()
    }
}

/// Builds indexes with a fresh embedding provider per build.
pub struct IndexBuilder {
    embedders: Arc<dyn EmbedderFactory>,
    embedding: EmbeddingProviderConfig,
    chunker: SentenceChunker,
}

impl IndexBuilder {
    pub fn new(
        embedders: Arc<dyn EmbedderFactory>,
        embedding: EmbeddingProviderConfig,
        chunk_size: usize,
    ) -> Self {
        Self {
            embedders,
            embedding,
            chunker: SentenceChunker::new(chunk_size),
        }
    }

    /// Build an index over `corpus` that answers with `model`.
    ///
    /// Every backend failure is reported as [`PipelineError::IndexBuild`].
    /// Emptiness is left for the embedding backend to reject.
    pub async fn build(
        &self,
        corpus: Corpus,
        model: Arc<dyn LlmProvider>,
    ) -> Result<KnowledgeIndex, PipelineError> {
        let chunks: Vec<Chunk> = corpus
            .documents()
            .iter()
            .flat_map(|doc| self.chunker.chunk(doc))
            .collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();

        let mut embedder = self
            .embedders
            .create_embedder(&self.embedding)
            .map_err(build_error)?;
        embedder.prepare(&texts).await.map_err(build_error)?;

        let embeddings = embedder
            .embed_documents(&texts)
            .await
            .map_err(build_error)?;
        if embeddings.len() != chunks.len() {
            return Err(PipelineError::IndexBuild(format!(
                "embedding backend returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let index = KnowledgeIndex {
            id: uuid::Uuid::new_v4().to_string(),
            corpus,
            chunks,
            embeddings,
            embedder: Arc::from(embedder),
            model,
            built_at: Utc::now(),
        };

        tracing::info!(
            index_id = %index.id,
            chunks = index.chunks.len(),
            embedder = index.embedder.display_name(),
            local = index.embedder.provider_type().is_local(),
            model = index.model.model(),
            "index built"
        );
        Ok(index)
    }
}

fn build_error(error: EmbeddingError) -> PipelineError {
    tracing::warn!(
        error = %error,
        retryable = error.is_retryable(),
        "embedding backend failed during index build"
    );
    PipelineError::IndexBuild(error.to_string())
}
