//! Query Engine
//!
//! Answers a question against a built index: embed the question, retrieve
//! the closest chunks, render the question-answering prompt, and stream the
//! model's answer back as tokens.

use futures_util::stream::BoxStream;
use futures_util::{future, StreamExt};
use rag_pipeline_core::streaming::UnifiedStreamEvent;
use rag_pipeline_llm::prompt::{render_qa_prompt, QA_SYSTEM_PROMPT};
use rag_pipeline_llm::{EventStream, LlmRequestOptions, Message};

use super::error::PipelineError;
use super::index::KnowledgeIndex;

/// Lazy, single-pass stream of answer tokens.
///
/// Ends after the last token, or after the first `Err` item.
pub type TokenStream = BoxStream<'static, Result<String, PipelineError>>;

/// Retrieval parameters for one query.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine {
    top_k: usize,
}

impl QueryEngine {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }

    /// Submit `question` against `index` and return the answer stream.
    ///
    /// Retrieval or submission failures are returned as
    /// [`PipelineError::QueryExecution`] and no stream is produced. Failures
    /// after submission arrive in-stream as a final `Err(PipelineError::Stream)`.
    pub async fn query(
        &self,
        index: &KnowledgeIndex,
        question: &str,
    ) -> Result<TokenStream, PipelineError> {
        let query_embedding = index
            .embed_query(question)
            .await
            .map_err(|e| PipelineError::QueryExecution(e.to_string()))?;

        let hits = index.search(&query_embedding, self.top_k);
        tracing::debug!(
            index_id = index.id(),
            retrieved = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved context"
        );

        let passages: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
        let prompt = render_qa_prompt(&passages, question);

        let events = index
            .model()
            .stream_message(
                vec![Message::user(prompt)],
                Some(QA_SYSTEM_PROMPT.to_string()),
                LlmRequestOptions::default(),
            )
            .await
            .map_err(|e| PipelineError::QueryExecution(e.to_string()))?;

        Ok(into_token_stream(events))
    }
}

/// Map unified events to tokens, ending at `Complete` or right after an error.
fn into_token_stream(events: EventStream) -> TokenStream {
    events
        .scan(false, |errored, event| {
            if *errored {
                return future::ready(None);
            }
            let item = match event {
                UnifiedStreamEvent::TextDelta { content } => {
                    Some((!content.is_empty()).then_some(Ok(content)))
                }
                UnifiedStreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                } => {
                    tracing::debug!(input_tokens, output_tokens, "answer usage");
                    Some(None)
                }
                UnifiedStreamEvent::Error { message, .. } => {
                    tracing::warn!(error = %message, "answer stream failed");
                    *errored = true;
                    Some(Some(Err(PipelineError::Stream(message))))
                }
                UnifiedStreamEvent::Complete { .. } => None,
            };
            future::ready(item)
        })
        .filter_map(future::ready)
        .boxed()
}
