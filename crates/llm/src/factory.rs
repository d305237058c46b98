//! Provider Factory
//!
//! Maps a [`ProviderConfig`] to the concrete provider implementation.

use std::sync::Arc;

use crate::extractive::ExtractiveProvider;
use crate::gemini::GeminiProvider;
use crate::openai::OpenAIProvider;
use crate::provider::LlmProvider;
use crate::types::{LlmError, LlmResult, ProviderConfig, ProviderType};

/// Create an LLM provider from a ProviderConfig.
///
/// Fails when the model name is blank or the HTTP client cannot be built.
/// Missing API keys are reported later, on the first request.
pub fn create_provider(config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    if config.model.trim().is_empty() {
        return Err(LlmError::InvalidRequest {
            message: format!("no model configured for provider {}", config.provider),
        });
    }

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Gemini => Arc::new(GeminiProvider::new(config.clone())?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config.clone())?),
        ProviderType::Extractive => Arc::new(ExtractiveProvider::new(config.clone())),
    };

    tracing::debug!(
        provider = provider.name(),
        model = provider.model(),
        "created LLM provider"
    );
    Ok(provider)
}
