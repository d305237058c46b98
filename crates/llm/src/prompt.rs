//! Question-Answering Prompt
//!
//! Renders retrieved context and a question into the single user message
//! sent to the model, and parses that message back apart for the offline
//! extractive provider.

/// Line that fences the context block on both sides.
pub const CONTEXT_FENCE: &str = "---------------------";

const CONTEXT_HEADER: &str = "Context information is below.";
const INSTRUCTION: &str =
    "Given the context information and not prior knowledge, answer the query.";
const QUERY_PREFIX: &str = "Query: ";
const ANSWER_SUFFIX: &str = "Answer: ";

/// System instruction sent alongside every question-answering prompt.
pub const QA_SYSTEM_PROMPT: &str = "You are an expert Q&A system. Always answer the query \
using the provided context information, and not prior knowledge. Never directly reference \
the given context in your answer.";

/// Render the question-answering prompt.
///
/// Passages are separated by blank lines, in retrieval order.
pub fn render_qa_prompt(passages: &[&str], query: &str) -> String {
    format!(
        "{header}\n{fence}\n{context}\n{fence}\n{instruction}\n{query_prefix}{query}\n{answer}",
        header = CONTEXT_HEADER,
        fence = CONTEXT_FENCE,
        context = passages.join("\n\n"),
        instruction = INSTRUCTION,
        query_prefix = QUERY_PREFIX,
        query = query.trim(),
        answer = ANSWER_SUFFIX,
    )
}

/// A question-answering prompt split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQaPrompt<'a> {
    pub context: &'a str,
    pub query: &'a str,
}

/// Parse a prompt produced by [`render_qa_prompt`].
///
/// Returns `None` when the text does not follow the template.
pub fn parse_qa_prompt(prompt: &str) -> Option<ParsedQaPrompt<'_>> {
    let (_, after_open) = prompt.split_once(CONTEXT_FENCE)?;
    let (context, after_close) = after_open.split_once(CONTEXT_FENCE)?;
    let (_, after_query) = after_close.split_once(QUERY_PREFIX)?;
    let query = after_query
        .rsplit_once(ANSWER_SUFFIX)
        .map(|(q, _)| q)
        .unwrap_or(after_query);

    Some(ParsedQaPrompt {
        context: context.trim(),
        query: query.trim(),
    })
}
