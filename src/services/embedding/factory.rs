//! Embedding Provider Factory

use super::gemini::GeminiEmbeddingProvider;
use super::provider::{
    EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType, EmbeddingResult,
};
use super::tfidf::TfIdfEmbeddingProvider;

/// Build a fresh, unprepared provider from its configuration.
///
/// Each index build gets its own instance so a corpus-fitted vocabulary is
/// never shared between indexes.
pub fn create_embedding_provider(
    config: &EmbeddingProviderConfig,
) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider {
        EmbeddingProviderType::TfIdf => Ok(Box::new(TfIdfEmbeddingProvider::new())),
        EmbeddingProviderType::Gemini => Ok(Box::new(GeminiEmbeddingProvider::new(config)?)),
    }
}
