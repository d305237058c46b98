//! Gemini Provider
//!
//! Implementation of the LlmProvider trait for Google's Generative Language
//! API. Streams through `streamGenerateContent` with `alt=sse`.

use async_trait::async_trait;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    EventStream, LlmError, LlmRequestOptions, LlmResult, Message, MessageRole, ProviderConfig,
};
use crate::http_client::build_http_client;
use crate::sse::spawn_event_stream;
use crate::streaming_adapters::GeminiAdapter;

/// Default Generative Language API endpoint
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_URL)
            .trim_end_matches('/')
    }

    /// Model path segment; accepts both `gemini-…` and `models/gemini-…`.
    fn model_path(&self) -> String {
        let model = self.config.model.trim();
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.base_url(),
            self.model_path()
        )
    }

    fn api_key(&self) -> LlmResult<String> {
        self.config
            .resolved_api_key()
            .ok_or_else(|| missing_api_key_error("gemini"))
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        // Gemini has no system role inside `contents`; fold those into the instruction.
        let mut system_parts: Vec<serde_json::Value> = Vec::new();
        if let Some(sys) = system {
            system_parts.push(serde_json::json!({ "text": sys }));
        }

        let mut contents: Vec<serde_json::Value> = Vec::new();
        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    system_parts.push(serde_json::json!({ "text": msg.content }));
                }
                MessageRole::User | MessageRole::Assistant => {
                    let role = if msg.role == MessageRole::User {
                        "user"
                    } else {
                        "model"
                    };
                    contents.push(serde_json::json!({
                        "role": role,
                        "parts": [{ "text": msg.content }]
                    }));
                }
            }
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request_options
                    .temperature_override
                    .unwrap_or(self.config.temperature),
                "maxOutputTokens": request_options
                    .max_tokens_override
                    .unwrap_or(self.config.max_tokens),
                "candidateCount": 1,
            }
        });

        if !system_parts.is_empty() {
            body["systemInstruction"] = serde_json::json!({ "parts": system_parts });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn context_window(&self) -> u32 {
        let model = self.config.model.to_lowercase();
        if model.contains("1.5-pro") {
            2_000_000
        } else if model.contains("gemini-1.0") || model.contains("gemini-pro") {
            32_768
        } else {
            1_000_000
        }
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<EventStream> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        tracing::debug!(model = %self.config.model, "submitting Gemini stream request");

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            return Err(parse_http_error(status, &body_text, "gemini"));
        }

        Ok(spawn_event_stream(
            response,
            Box::new(GeminiAdapter::new(&self.config.model)),
        ))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let api_key = self.api_key()?;

        // Fetching the model resource validates both the key and the model name.
        let response = self
            .client
            .get(format!("{}/{}", self.base_url(), self.model_path()))
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(status, &body, "gemini"))
        }
    }
}
