//! Services
//!
//! Business logic for the pipeline: embedding backends and the knowledge
//! (index, query, lifecycle) system.

pub mod embedding;
pub mod knowledge;

pub use knowledge::{PipelineError, PipelineState, QueryResult, RagPipeline};
