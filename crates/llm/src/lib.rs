//! RAG Pipeline LLM
//!
//! Provides a unified streaming interface over the language-model backends
//! the pipeline can answer with:
//! - Google Gemini (`streamGenerateContent`)
//! - OpenAI-compatible chat completions
//! - Extractive (offline, answers from the retrieved context only)
//!
//! Also includes the provider-specific stream adapters, the HTTP client
//! factory and the question-answering prompt template.

pub mod extractive;
pub mod factory;
pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod prompt;
pub mod provider;
mod sse;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use extractive::ExtractiveProvider;
pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

// Re-export streaming adapters
pub use streaming_adapters::{GeminiAdapter, OpenAIAdapter};
