//! Gemini Embedding Provider
//!
//! Implements the `EmbeddingProvider` trait for Google's Generative Language
//! embedding models.
//!
//! ## API Details
//!
//! - Endpoint: `POST {base}/models/{model}:batchEmbedContents`
//! - Auth: `x-goog-api-key: {api_key}`
//! - Body: `{ requests: [{ model, content: { parts: [{ text }] }, taskType }] }`
//! - Response: `{ embeddings: [{ values: [...] }] }`, in request order

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};
use rag_pipeline_llm::build_http_client;

/// Default Generative Language API endpoint.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Output dimension of text-embedding-004.
const DEFAULT_DIMENSION: usize = 768;

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}

/// Gemini embedding provider.
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    /// Model path, always prefixed with `models/`.
    model: String,
    base_url: String,
    batch_size: usize,
    dimension: usize,
    display_name: String,
}

impl GeminiEmbeddingProvider {
    /// Create a provider from its configuration.
    ///
    /// Fails when no API key is configured or found in `GEMINI_API_KEY`.
    pub fn new(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| EmbeddingError::AuthenticationFailed {
                message: "Gemini API key is not configured (set embedding.api_key or GEMINI_API_KEY)"
                    .to_string(),
            })?;

        let model_name = config.model.trim();
        let model = if model_name.starts_with("models/") {
            model_name.to_string()
        } else {
            format!("models/{}", model_name)
        };

        let client = build_http_client(config.proxy.as_ref()).map_err(|e| {
            EmbeddingError::InvalidConfig {
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            client,
            api_key,
            display_name: format!("Gemini ({})", model_name),
            model,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(GEMINI_API_URL)
                .trim_end_matches('/')
                .to_string(),
            batch_size: config.batch_size.max(1),
            dimension: DEFAULT_DIMENSION,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:batchEmbedContents", self.base_url, self.model)
    }

    fn build_request_body(&self, texts: &[&str], task_type: &str) -> serde_json::Value {
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": self.model,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": task_type,
                })
            })
            .collect();
        serde_json::json!({ "requests": requests })
    }

    /// Embed one batch that fits within the API limit.
    async fn embed_batch(&self, texts: &[&str], task_type: &str) -> EmbeddingResult<Vec<Vec<f32>>> {
        let max = EmbeddingProviderType::Gemini.max_batch_size();
        if texts.len() > max {
            return Err(EmbeddingError::BatchSizeLimitExceeded {
                requested: texts.len(),
                max_allowed: max,
            });
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&self.build_request_body(texts, task_type))
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::NetworkError {
                message: format!("failed to read response body: {}", e),
            })?;

        if status != 200 {
            return Err(self.map_http_error(status, &body));
        }

        let parsed: BatchEmbedResponse =
            serde_json::from_str(&body).map_err(|e| EmbeddingError::ParseError {
                message: format!("failed to parse embedding response: {}", e),
            })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::ParseError {
                message: format!(
                    "expected {} embeddings but Gemini returned {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_connect() {
            EmbeddingError::ProviderUnavailable {
                message: format!("Cannot connect to Gemini API at {}: {}", self.base_url, err),
            }
        } else {
            EmbeddingError::NetworkError {
                message: err.to_string(),
            }
        }
    }

    fn map_http_error(&self, status: u16, body: &str) -> EmbeddingError {
        let detail = serde_json::from_str::<GeminiErrorResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .and_then(|d| d.message);
        let message = detail.as_deref().unwrap_or(body);

        match status {
            400 => EmbeddingError::InvalidConfig {
                message: format!("Gemini bad request: {}", message),
            },
            401 | 403 => EmbeddingError::AuthenticationFailed {
                message: format!("Gemini authentication failed: {}", message),
            },
            404 => EmbeddingError::ModelNotFound {
                model: format!("'{}': {}", self.model, message),
            },
            429 => EmbeddingError::RateLimited {
                message: message.to_string(),
                retry_after: None,
            },
            _ => EmbeddingError::ServerError {
                message: message.to_string(),
                status: Some(status),
            },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch, TASK_DOCUMENT).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[query], TASK_QUERY)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::ParseError {
                message: "Gemini returned no embedding for the query".to_string(),
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        self.embed_batch(&["health check"], TASK_QUERY).await.map(|_| ())
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Gemini
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}
