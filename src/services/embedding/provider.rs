//! Embedding Provider Abstraction Layer
//!
//! Defines the async `EmbeddingProvider` trait and supporting types for
//! pluggable embedding backends. Each backend (TF-IDF, Gemini) implements
//! this trait so the index builder can stay backend-agnostic.

use async_trait::async_trait;
use rag_pipeline_core::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingError {
    /// Authentication failed (invalid or missing API key).
    AuthenticationFailed { message: String },

    /// The requested model was not found or is not available.
    ModelNotFound { model: String },

    /// The provider is not reachable or not ready.
    ProviderUnavailable { message: String },

    /// The input batch exceeds the provider's maximum batch size.
    BatchSizeLimitExceeded {
        requested: usize,
        max_allowed: usize,
    },

    /// A network or connection error occurred.
    NetworkError { message: String },

    /// The provider returned an unexpected or unparseable response.
    ParseError { message: String },

    /// The provider returned an HTTP error.
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Rate limit exceeded.
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    /// Configuration is invalid or incomplete.
    InvalidConfig { message: String },

    /// Any other error.
    Other { message: String },
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed { message } => {
                write!(f, "authentication failed: {}", message)
            }
            Self::ModelNotFound { model } => write!(f, "model not found: {}", model),
            Self::ProviderUnavailable { message } => {
                write!(f, "provider unavailable: {}", message)
            }
            Self::BatchSizeLimitExceeded {
                requested,
                max_allowed,
            } => write!(
                f,
                "batch size {} exceeds maximum {}",
                requested, max_allowed
            ),
            Self::NetworkError { message } => write!(f, "network error: {}", message),
            Self::ParseError { message } => write!(f, "parse error: {}", message),
            Self::ServerError { message, status } => {
                if let Some(code) = status {
                    write!(f, "server error (HTTP {}): {}", code, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            Self::RateLimited { message, .. } => write!(f, "rate limited: {}", message),
            Self::InvalidConfig { message } => write!(f, "invalid config: {}", message),
            Self::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for EmbeddingError {}

impl EmbeddingError {
    /// Whether this error is transient and the operation could succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::NetworkError { .. }
                | EmbeddingError::RateLimited { .. }
                | EmbeddingError::ServerError { .. }
                | EmbeddingError::ProviderUnavailable { .. }
        )
    }
}

/// Convenience alias for embedding operation results.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

// ---------------------------------------------------------------------------
// Provider type enum
// ---------------------------------------------------------------------------

/// Identifies the embedding backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Local TF-IDF vectorization (no external dependencies).
    TfIdf,
    /// Google Generative Language embedding models.
    Gemini,
}

impl EmbeddingProviderType {
    /// Default model identifier for this provider type.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::TfIdf => "tfidf",
            Self::Gemini => "text-embedding-004",
        }
    }

    /// Maximum number of texts accepted in one batch.
    pub fn max_batch_size(&self) -> usize {
        match self {
            Self::TfIdf => 1000,
            Self::Gemini => 100,
        }
    }

    /// Whether this provider runs without network calls.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::TfIdf)
    }
}

impl fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TfIdf => write!(f, "tfidf"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider configuration
// ---------------------------------------------------------------------------

/// Configuration for an embedding provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingProviderConfig {
    /// The embedding backend type.
    pub provider: EmbeddingProviderType,

    /// Model identifier (e.g., "text-embedding-004").
    pub model: String,

    /// API key for remote providers. Accepted from the settings file, never
    /// written back to it.
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// Base URL override for the provider API.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,

    /// Maximum number of texts to embed in a single request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Proxy for outbound requests. None means a direct connection.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxy: Option<ProxyConfig>,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self::new(EmbeddingProviderType::TfIdf)
    }
}

impl EmbeddingProviderConfig {
    /// Create a new configuration with sensible defaults for the given provider type.
    pub fn new(provider: EmbeddingProviderType) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            batch_size: provider.max_batch_size().min(default_batch_size()),
            proxy: None,
        }
    }

    /// Validate the configuration and return the first issue found.
    ///
    /// API keys are not checked here; remote providers report a missing key
    /// when they are constructed.
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                message: "model name must not be empty".to_string(),
            });
        }

        if self.batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "batch_size must be at least 1".to_string(),
            });
        }
        let max = self.provider.max_batch_size();
        if self.batch_size > max {
            return Err(EmbeddingError::InvalidConfig {
                message: format!(
                    "batch_size {} exceeds {} maximum of {}",
                    self.batch_size, self.provider, max
                ),
            });
        }

        Ok(())
    }

    /// The configured API key, falling back to `GEMINI_API_KEY` for Gemini.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| match self.provider {
                EmbeddingProviderType::Gemini => std::env::var("GEMINI_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                EmbeddingProviderType::TfIdf => None,
            })
    }
}

// ---------------------------------------------------------------------------
// Embedding provider trait
// ---------------------------------------------------------------------------

/// Async trait for embedding providers.
///
/// Implementations produce dense vector representations of text. The trait
/// is object-safe and requires `Send + Sync` so built indexes can be shared
/// across Tokio tasks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fit the provider to the corpus about to be indexed.
    ///
    /// Called exactly once, before any embedding. Corpus-dependent providers
    /// (TF-IDF) build their vocabulary here; the default does nothing.
    async fn prepare(&mut self, _corpus: &[&str]) -> EmbeddingResult<()> {
        Ok(())
    }

    /// Embed a batch of document texts, one vector per input, in order.
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single query text.
    ///
    /// The default implementation delegates to `embed_documents` with a
    /// single-element slice.
    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let results = self.embed_documents(&[query]).await?;
        results.into_iter().next().ok_or_else(|| EmbeddingError::Other {
            message: "embed_documents returned empty results for single query".to_string(),
        })
    }

    /// Dimensionality of the produced vectors (0 for TF-IDF before `prepare`).
    fn dimension(&self) -> usize;

    /// Check if the provider is ready and reachable.
    async fn health_check(&self) -> EmbeddingResult<()>;

    /// Returns the provider type identifier.
    fn provider_type(&self) -> EmbeddingProviderType;

    /// Returns a human-readable name for this provider instance.
    fn display_name(&self) -> &str;
}
