//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers.

use async_trait::async_trait;
use futures_util::StreamExt;
use rag_pipeline_core::streaming::UnifiedStreamEvent;

use super::types::{
    EventStream, LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    UsageStats,
};

/// Trait that all LLM providers must implement.
///
/// Provides a unified interface for:
/// - Streaming completions (stream_message)
/// - Single message completions (send_message)
/// - Health checking
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;

    /// Returns the model's context window size in tokens. Default: 128,000.
    fn context_window(&self) -> u32 {
        128_000
    }

    /// Submit a request and return its event stream.
    ///
    /// Errors raised while building or submitting the request are returned
    /// as `Err`; once a stream is returned, later backend failures arrive as
    /// a terminal `UnifiedStreamEvent::Error`.
    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<EventStream>;

    /// Send a message and get a complete response.
    ///
    /// The default implementation drains `stream_message`.
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let mut stream = self
            .stream_message(messages, system, request_options)
            .await?;

        let mut content = String::new();
        let mut usage = UsageStats::default();
        let mut stop_reason = None;

        while let Some(event) = stream.next().await {
            match event {
                UnifiedStreamEvent::TextDelta { content: delta } => content.push_str(&delta),
                UnifiedStreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                } => {
                    usage.input_tokens = input_tokens;
                    usage.output_tokens = output_tokens;
                }
                UnifiedStreamEvent::Error { message, .. } => {
                    return Err(LlmError::Other { message });
                }
                UnifiedStreamEvent::Complete { stop_reason: reason } => {
                    stop_reason = reason;
                    break;
                }
            }
        }

        Ok(LlmResponse {
            content: if content.is_empty() { None } else { Some(content) },
            stop_reason,
            usage,
            model: self.model().to_string(),
        })
    }

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> LlmResult<()>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
