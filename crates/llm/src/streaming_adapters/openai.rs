//! OpenAI Chat Completions SSE Stream Adapter
//!
//! Works for any OpenAI-compatible endpoint. `finish_reason` arrives before
//! the usage chunk when `include_usage` is requested, so completion is only
//! signalled on the `[DONE]` sentinel.

use rag_pipeline_core::streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
use serde::Deserialize;

use super::sse_payload;

#[derive(Debug, Deserialize)]
struct OpenAIEvent {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

/// Adapter for OpenAI chat completion chunks
pub struct OpenAIAdapter {
    model: String,
    finish_reason: Option<String>,
    usage: Option<(u32, u32)>,
}

impl OpenAIAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            finish_reason: None,
            usage: None,
        }
    }

    fn finish(&mut self) -> Vec<UnifiedStreamEvent> {
        tracing::debug!(
            model = %self.model,
            reason = ?self.finish_reason,
            "OpenAI stream finished"
        );
        let mut events = Vec::new();
        if let Some((input_tokens, output_tokens)) = self.usage.take() {
            events.push(UnifiedStreamEvent::Usage {
                input_tokens,
                output_tokens,
            });
        }
        events.push(UnifiedStreamEvent::Complete {
            stop_reason: self.finish_reason.take(),
        });
        events
    }
}

impl StreamAdapter for OpenAIAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError> {
        let json_str = match sse_payload(input) {
            Some(payload) => payload,
            None => return Ok(vec![]),
        };

        if json_str == "[DONE]" {
            return Ok(self.finish());
        }

        let event: OpenAIEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(error) = event.error {
            return Ok(vec![UnifiedStreamEvent::Error {
                message: error.message,
                code: error.error_type,
            }]);
        }

        if let Some(usage) = event.usage {
            self.usage = Some((usage.prompt_tokens, usage.completion_tokens));
        }

        let mut events = vec![];
        for choice in event.choices {
            if let Some(content) = choice.delta.and_then(|d| d.content) {
                if !content.is_empty() {
                    events.push(UnifiedStreamEvent::TextDelta { content });
                }
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(reason);
            }
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.finish_reason = None;
        self.usage = None;
    }
}
