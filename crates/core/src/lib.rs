//! RAG Pipeline Core
//!
//! Foundational types shared by the LLM crate and the pipeline crate. This
//! crate depends on nothing else in the workspace.
//!
//! ## Module Organization
//!
//! - `streaming` - Unified stream event type and the provider adapter trait
//! - `proxy` - Proxy configuration used by every HTTP-backed provider

pub mod proxy;
pub mod streaming;

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{AdapterError, StreamAdapter, UnifiedStreamEvent};
