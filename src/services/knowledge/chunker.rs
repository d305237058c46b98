//! Sentence Chunker
//!
//! Splits a document into chunks of whole sentences, packing consecutive
//! sentences together up to a character budget. A sentence longer than the
//! budget is split on word boundaries.

use serde::{Deserialize, Serialize};

use super::corpus::Document;

/// A chunk produced by splitting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier ("{document_id}:{index}").
    pub chunk_id: String,
    /// ID of the source document.
    pub document_id: String,
    /// Text content of this chunk.
    pub content: String,
    /// Zero-based index of this chunk within the document.
    pub index: usize,
    /// Byte offset of this chunk's start within the original document.
    pub byte_offset: usize,
}

/// Packs sentences into chunks of at most `max_chunk_size` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    max_chunk_size: usize,
}

impl SentenceChunker {
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Split a document into chunks. Blank documents yield no chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut pieces: Vec<(usize, String)> = Vec::new();
        let mut current = String::new();
        let mut current_offset = 0usize;

        for (offset, sentence) in split_into_sentences(&document.content) {
            for (sub_offset, part) in self.fit_sentence(offset, sentence) {
                let joined_len = if current.is_empty() {
                    part.chars().count()
                } else {
                    current.chars().count() + 1 + part.chars().count()
                };

                if joined_len > self.max_chunk_size && !current.is_empty() {
                    pieces.push((current_offset, std::mem::take(&mut current)));
                }
                if current.is_empty() {
                    current_offset = sub_offset;
                } else {
                    current.push(' ');
                }
                current.push_str(part);
            }
        }

        if !current.is_empty() {
            pieces.push((current_offset, current));
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, (byte_offset, content))| Chunk {
                chunk_id: format!("{}:{}", document.id, index),
                document_id: document.id.clone(),
                content,
                index,
                byte_offset,
            })
            .collect()
    }

    /// Return the sentence whole, or word-packed parts when it is over budget.
    fn fit_sentence<'a>(&self, offset: usize, sentence: &'a str) -> Vec<(usize, &'a str)> {
        if sentence.chars().count() <= self.max_chunk_size {
            return vec![(offset, sentence)];
        }

        let mut parts = Vec::new();
        let mut start: Option<usize> = None;
        let mut end = 0usize;
        let mut len = 0usize;

        for (word_start, word) in words(sentence) {
            let word_len = word.chars().count();
            if let Some(s) = start {
                if len + 1 + word_len > self.max_chunk_size {
                    parts.push((offset + s, &sentence[s..end]));
                    start = None;
                }
            }
            match start {
                None => {
                    start = Some(word_start);
                    len = word_len;
                }
                Some(_) => len += 1 + word_len,
            }
            end = word_start + word.len();
        }
        if let Some(s) = start {
            parts.push((offset + s, &sentence[s..end]));
        }
        parts
    }
}

/// Whitespace-separated words with their byte offsets.
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace().map(move |word| {
        let offset = word.as_ptr() as usize - text.as_ptr() as usize;
        (offset, word)
    })
}

/// Split text into trimmed sentences with their byte offsets.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text.
fn split_into_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut start = 0;
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if (b == b'.' || b == b'!' || b == b'?')
            && (i + 1 >= len || bytes[i + 1].is_ascii_whitespace())
        {
            push_trimmed(&mut sentences, text, start, i + 1);
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            start = i;
            continue;
        }
        i += 1;
    }

    if start < len {
        push_trimmed(&mut sentences, text, start, len);
    }

    sentences
}

fn push_trimmed<'a>(out: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    let offset = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        out.push((offset, trimmed));
    }
}
