//! RAG Pipeline
//!
//! A minimal retrieval-augmented generation pipeline for a chat host.
//! It includes:
//! - Corpus loading, sentence chunking and in-memory vector indexing
//! - Streaming question answering over the built index
//! - A lifecycle controller with one-shot recovery
//! - JSON configuration storage and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{PipelineSettings, SettingsUpdate};
pub use services::knowledge::{
    Backends, PipelineError, PipelineState, QueryResult, RagPipeline, TokenStream,
};
pub use state::AppState;
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
