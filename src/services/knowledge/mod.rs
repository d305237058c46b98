//! Knowledge System
//!
//! The indexing-and-query pipeline:
//! - `corpus`: where the indexed text comes from
//! - `chunker`: sentence-packed chunking
//! - `index`: index builder and in-memory index
//! - `query`: retrieval, prompting and answer streaming
//! - `backends`: factories for the model and embedding providers
//! - `pipeline`: lifecycle controller with one-shot recovery

pub mod backends;
pub mod chunker;
pub mod corpus;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod query;

pub use backends::{Backends, DefaultBackends, EmbedderFactory, LlmFactory};
pub use chunker::{Chunk, SentenceChunker};
pub use corpus::{Corpus, CorpusSource, Document, BUILTIN_PASSAGE};
pub use error::PipelineError;
pub use index::{IndexBuilder, KnowledgeIndex, ScoredChunk};
pub use pipeline::{HealthReport, PipelineState, QueryResult, RagPipeline};
pub use query::{QueryEngine, TokenStream};
