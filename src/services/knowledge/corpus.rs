//! Corpus Source
//!
//! Supplies the text that gets indexed: either the host-editable seed text
//! or a fixed passage.

use serde::{Deserialize, Serialize};

use crate::models::settings::{CorpusSourceKind, PipelineSettings};

/// Fixed passage served by [`CorpusSourceKind::Builtin`].
pub const BUILTIN_PASSAGE: &str = "Artificial Intelligence (AI) is the simulation of human \
intelligence by machines. Machine learning is a subset of AI that enables systems to learn \
from data. Deep learning is a type of machine learning based on neural networks.";

/// A single source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Full text content of the document.
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Ordered, immutable set of documents an index is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// A corpus holding exactly one document with a fresh id.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Document::new(uuid::Uuid::new_v4().to_string(), text)])
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Reads the seed text out of the current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSource {
    kind: CorpusSourceKind,
    configured_text: String,
}

impl CorpusSource {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            kind: settings.corpus_source,
            configured_text: settings.seed_text.clone(),
        }
    }

    /// The text to index. Never fails.
    pub fn seed_text(&self) -> String {
        match self.kind {
            CorpusSourceKind::Configured => self.configured_text.clone(),
            CorpusSourceKind::Builtin => BUILTIN_PASSAGE.to_string(),
        }
    }

    /// The seed text wrapped as a one-document corpus.
    pub fn load(&self) -> Corpus {
        Corpus::from_text(self.seed_text())
    }
}
