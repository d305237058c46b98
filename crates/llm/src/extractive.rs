//! Extractive Provider
//!
//! An offline stand-in for a generative model. It reads the question-answering
//! prompt, picks the context sentence that shares the most terms with the
//! query, and streams it back word by word. Needs no API key or network, so
//! the pipeline can run end to end on a laptop or in CI.

use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use rag_pipeline_core::streaming::UnifiedStreamEvent;

use super::prompt::parse_qa_prompt;
use super::provider::LlmProvider;
use super::types::{
    EventStream, LlmRequestOptions, LlmResult, Message, MessageRole, ProviderConfig,
};

/// Answer used when the context holds nothing to extract.
pub const EMPTY_RESPONSE: &str = "Empty Response";

/// Extractive provider
pub struct ExtractiveProvider {
    config: ProviderConfig,
}

impl ExtractiveProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Choose the answer sentence for a prompt.
    fn extract_answer(prompt: &str) -> String {
        let parsed = match parse_qa_prompt(prompt) {
            Some(parsed) => parsed,
            None => return EMPTY_RESPONSE.to_string(),
        };

        let query_terms: HashSet<String> = terms(parsed.query).collect();
        let mut best: Option<(usize, &str)> = None;

        for sentence in split_sentences(parsed.context) {
            let sentence_terms: HashSet<String> = terms(sentence).collect();
            let score = query_terms.intersection(&sentence_terms).count();
            // Strictly greater keeps the earliest sentence on ties.
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, sentence));
            }
        }

        match best {
            Some((_, sentence)) => sentence.to_string(),
            None => EMPTY_RESPONSE.to_string(),
        }
    }
}

/// Lowercased alphanumeric terms of at least two characters.
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_lowercase())
}

/// Split text into trimmed sentences on `.`, `!` and `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let at_boundary = matches!(ch, '.' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + ch.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[async_trait]
impl LlmProvider for ExtractiveProvider {
    fn name(&self) -> &'static str {
        "extractive"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<EventStream> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let answer = Self::extract_answer(prompt);
        let mut events: Vec<UnifiedStreamEvent> = answer
            .split_inclusive(' ')
            .map(UnifiedStreamEvent::text)
            .collect();
        events.push(UnifiedStreamEvent::Usage {
            input_tokens: prompt.split_whitespace().count() as u32,
            output_tokens: events.len() as u32,
        });
        events.push(UnifiedStreamEvent::Complete {
            stop_reason: Some("stop".to_string()),
        });

        Ok(stream::iter(events).boxed())
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}
