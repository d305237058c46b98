//! Provider-Specific Stream Adapters
//!
//! Each adapter handles the unique streaming format of its provider.

pub mod gemini;
pub mod openai;

pub use gemini::GeminiAdapter;
pub use openai::OpenAIAdapter;

/// Strip the SSE `data:` prefix. Returns `None` for comment and field lines
/// that carry no payload (`event:`, `id:`, `: keep-alive`).
pub(crate) fn sse_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        return Some(rest.trim_start());
    }
    if trimmed.is_empty()
        || trimmed.starts_with(':')
        || trimmed.starts_with("event:")
        || trimmed.starts_with("id:")
        || trimmed.starts_with("retry:")
    {
        return None;
    }
    Some(trimmed)
}
