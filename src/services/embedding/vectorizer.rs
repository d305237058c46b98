//! TF-IDF Vectorizer
//!
//! Local, offline text vectorization using TF-IDF (Term Frequency, Inverse
//! Document Frequency). The vocabulary is fitted once on the corpus being
//! indexed and then frozen, so document and query vectors share one space.

use std::collections::{HashMap, HashSet};

/// Maximum vocabulary size (number of unique tokens tracked).
const MAX_VOCAB_SIZE: usize = 8192;

/// Vocabulary learned from a corpus.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    /// Map from token to column index in the TF-IDF vector.
    token_to_idx: HashMap<String, usize>,
    /// Inverse document frequency per column.
    idf: Vec<f32>,
    /// Number of documents the vocabulary was fitted on.
    num_docs: usize,
}

impl TfIdfVectorizer {
    /// Fit a vocabulary on `corpus`, one entry per document.
    pub fn fit(corpus: &[&str]) -> Self {
        let num_docs = corpus.len().max(1);

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for tok in unique {
                *doc_freq.entry(tok).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically for a stable layout.
        let mut entries: Vec<(String, usize)> = doc_freq.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(MAX_VOCAB_SIZE);

        let mut token_to_idx = HashMap::with_capacity(entries.len());
        let mut idf = Vec::with_capacity(entries.len());
        for (idx, (token, freq)) in entries.into_iter().enumerate() {
            token_to_idx.insert(token, idx);
            // Smoothed: log(N / df) + 1 keeps terms present in every document.
            idf.push(((num_docs as f32) / (freq as f32)).ln() + 1.0);
        }

        Self {
            token_to_idx,
            idf,
            num_docs,
        }
    }

    /// Number of columns in every produced vector.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Number of documents the vocabulary was fitted on.
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// L2-normalised TF-IDF vector for `text`.
    ///
    /// Text with no known tokens yields the zero vector.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension();
        if dim == 0 {
            return Vec::new();
        }

        let tokens = tokenize(text);
        let total_tokens = tokens.len().max(1) as f32;

        let mut tf = vec![0.0f32; dim];
        for tok in &tokens {
            if let Some(&idx) = self.token_to_idx.get(tok.as_str()) {
                tf[idx] += 1.0 / total_tokens;
            }
        }

        for (value, idf) in tf.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let mag: f32 = tf.iter().map(|v| v * v).sum::<f32>().sqrt();
        if mag > 0.0 {
            for v in &mut tf {
                *v /= mag;
            }
        }

        tf
    }
}

/// Compute the cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Lowercase, split on non-alphanumeric characters, drop single characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}
