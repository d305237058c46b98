//! Gemini `streamGenerateContent` SSE Stream Adapter
//!
//! With `alt=sse` every event is a full `GenerateContentResponse`. Usage
//! metadata is repeated on each chunk, so only the last value is reported,
//! right before completion.

use rag_pipeline_core::streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
use serde::Deserialize;

use super::sse_payload;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEvent {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Finish reasons that mean the answer was withheld rather than completed.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT"];

/// Adapter for Gemini streaming responses
pub struct GeminiAdapter {
    model: String,
    usage: Option<(u32, u32)>,
}

impl GeminiAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            usage: None,
        }
    }
}

impl StreamAdapter for GeminiAdapter {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError> {
        let json_str = match sse_payload(input) {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Ok(vec![]),
        };

        let event: GeminiEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(error) = event.error {
            return Ok(vec![UnifiedStreamEvent::Error {
                message: error.message,
                code: error.status,
            }]);
        }

        if let Some(reason) = event.prompt_feedback.and_then(|f| f.block_reason) {
            return Ok(vec![UnifiedStreamEvent::Error {
                message: format!("Prompt blocked by Gemini ({})", reason),
                code: Some(reason),
            }]);
        }

        if let Some(usage) = event.usage_metadata {
            self.usage = Some((usage.prompt_token_count, usage.candidates_token_count));
        }

        let mut events = vec![];
        let mut finish_reason = None;

        // Only the first candidate is requested.
        if let Some(candidate) = event.candidates.into_iter().next() {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                        events.push(UnifiedStreamEvent::TextDelta { content: text });
                    }
                }
            }
            finish_reason = candidate.finish_reason;
        }

        if let Some(reason) = finish_reason {
            if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) {
                events.push(UnifiedStreamEvent::Error {
                    message: format!("Response blocked by Gemini ({})", reason),
                    code: Some(reason),
                });
                return Ok(events);
            }
            if let Some((input_tokens, output_tokens)) = self.usage.take() {
                events.push(UnifiedStreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                });
            }
            tracing::debug!(model = %self.model, reason = %reason, "Gemini stream finished");
            events.push(UnifiedStreamEvent::Complete {
                stop_reason: Some(reason.to_lowercase()),
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.usage = None;
    }
}
