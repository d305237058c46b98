//! Pipeline Errors

use thiserror::Error;

/// Failures of the indexing and query pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The corpus could not be turned into an index.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// A built index could not answer a question.
    #[error("Query failed: {0}")]
    QueryExecution(String),

    /// No index is being served.
    #[error("Index not initialized. Please check startup logs.")]
    NotInitialized,

    /// The settings cannot be used to build an index.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The backend failed after the answer started streaming.
    #[error("Stream interrupted: {0}")]
    Stream(String),
}

impl PipelineError {
    /// Whether `answer` runs its recovery cycle for this error.
    pub fn triggers_recovery(&self) -> bool {
        matches!(self, PipelineError::QueryExecution(_))
    }
}
