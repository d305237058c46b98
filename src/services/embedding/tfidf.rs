//! TF-IDF Embedding Provider
//!
//! Exposes [`TfIdfVectorizer`] through the [`EmbeddingProvider`] trait. The
//! vocabulary is fitted in `prepare`; embedding before that is an error
//! rather than a silent empty vector.

use async_trait::async_trait;

use super::provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderType, EmbeddingResult,
};
use super::vectorizer::TfIdfVectorizer;

/// Local TF-IDF embedding provider.
#[derive(Debug, Default)]
pub struct TfIdfEmbeddingProvider {
    vectorizer: Option<TfIdfVectorizer>,
}

impl TfIdfEmbeddingProvider {
    /// Create a provider with no vocabulary yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the vocabulary has been fitted.
    pub fn is_ready(&self) -> bool {
        self.vectorizer.is_some()
    }

    fn vectorizer(&self) -> EmbeddingResult<&TfIdfVectorizer> {
        self.vectorizer
            .as_ref()
            .ok_or_else(|| EmbeddingError::ProviderUnavailable {
                message: "TF-IDF vocabulary has not been built yet".to_string(),
            })
    }
}

#[async_trait]
impl EmbeddingProvider for TfIdfEmbeddingProvider {
    async fn prepare(&mut self, corpus: &[&str]) -> EmbeddingResult<()> {
        let vectorizer = TfIdfVectorizer::fit(corpus);
        if vectorizer.dimension() == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "corpus contains no indexable terms".to_string(),
            });
        }
        tracing::debug!(
            documents = vectorizer.num_docs(),
            dimension = vectorizer.dimension(),
            "fitted TF-IDF vocabulary"
        );
        self.vectorizer = Some(vectorizer);
        Ok(())
    }

    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let vectorizer = self.vectorizer()?;
        Ok(documents.iter().map(|d| vectorizer.transform(d)).collect())
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.vectorizer()?.transform(query))
    }

    fn dimension(&self) -> usize {
        self.vectorizer.as_ref().map_or(0, |v| v.dimension())
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        self.vectorizer().map(|_| ())
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::TfIdf
    }

    fn display_name(&self) -> &str {
        "TF-IDF (Local)"
    }
}
