//! Embedding Backends
//!
//! - `provider`: the `EmbeddingProvider` trait, config and errors
//! - `vectorizer`: TF-IDF math and cosine similarity
//! - `tfidf`: local TF-IDF provider
//! - `gemini`: Gemini `batchEmbedContents` provider
//! - `factory`: builds a provider from configuration

pub mod factory;
pub mod gemini;
pub mod provider;
pub mod tfidf;
pub mod vectorizer;

pub use factory::create_embedding_provider;
pub use gemini::GeminiEmbeddingProvider;
pub use provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};
pub use tfidf::TfIdfEmbeddingProvider;
pub use vectorizer::{cosine_similarity, TfIdfVectorizer};
