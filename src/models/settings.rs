//! Settings Models
//!
//! Pipeline configuration stored in config.json.

use rag_pipeline_llm::ProviderConfig;
use serde::{Deserialize, Serialize};

use crate::services::embedding::EmbeddingProviderConfig;

/// Seed text indexed when nothing else is configured.
pub const DEFAULT_SEED_TEXT: &str =
    "The capital of France is Paris. The capital of Italy is Rome.";

/// Question asked when the host sends an empty message.
pub const DEFAULT_TEST_QUERY: &str = "What is AI?";

/// Where the corpus text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusSourceKind {
    /// The editable `seed_text` setting.
    #[default]
    Configured,
    /// The fixed passage about artificial intelligence.
    Builtin,
}

/// When a configuration update rebuilds the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReinitializePolicy {
    /// Rebuild on every update.
    #[default]
    Always,
    /// Rebuild only when the pipeline is not ready.
    WhenNotReady,
}

/// Retrieval tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of chunks placed in the prompt.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_top_k() -> usize {
    2
}

fn default_chunk_size() -> usize {
    1024
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Pipeline configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Host-editable corpus text
    pub seed_text: String,
    /// Which corpus to index
    pub corpus_source: CorpusSourceKind,
    /// Fallback question for empty messages
    pub test_query: String,
    /// Build the index when the controller is created
    pub eager_initialize: bool,
    /// Build the index from `answer` when none exists
    pub auto_recover_on_missing_index: bool,
    /// Rebuild policy for configuration updates
    pub reinitialize_on_update: ReinitializePolicy,
    /// Language model used to answer
    pub llm: ProviderConfig,
    /// Embedding backend used to index
    pub embedding: EmbeddingProviderConfig,
    pub retrieval: RetrievalSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            seed_text: DEFAULT_SEED_TEXT.to_string(),
            corpus_source: CorpusSourceKind::default(),
            test_query: DEFAULT_TEST_QUERY.to_string(),
            eager_initialize: false,
            auto_recover_on_missing_index: false,
            reinitialize_on_update: ReinitializePolicy::default(),
            llm: ProviderConfig::default(),
            embedding: EmbeddingProviderConfig::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub seed_text: Option<String>,
    pub corpus_source: Option<CorpusSourceKind>,
    pub test_query: Option<String>,
    pub eager_initialize: Option<bool>,
    pub auto_recover_on_missing_index: Option<bool>,
    pub reinitialize_on_update: Option<ReinitializePolicy>,
    pub llm: Option<ProviderConfig>,
    pub embedding: Option<EmbeddingProviderConfig>,
    pub top_k: Option<usize>,
    pub chunk_size: Option<usize>,
}

impl PipelineSettings {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(seed_text) = update.seed_text {
            self.seed_text = seed_text;
        }
        if let Some(source) = update.corpus_source {
            self.corpus_source = source;
        }
        if let Some(query) = update.test_query {
            self.test_query = query;
        }
        if let Some(eager) = update.eager_initialize {
            self.eager_initialize = eager;
        }
        if let Some(auto_recover) = update.auto_recover_on_missing_index {
            self.auto_recover_on_missing_index = auto_recover;
        }
        if let Some(policy) = update.reinitialize_on_update {
            self.reinitialize_on_update = policy;
        }
        if let Some(llm) = update.llm {
            self.llm = llm;
        }
        if let Some(embedding) = update.embedding {
            self.embedding = embedding;
        }
        if let Some(top_k) = update.top_k {
            self.retrieval.top_k = top_k;
        }
        if let Some(chunk_size) = update.chunk_size {
            self.retrieval.chunk_size = chunk_size;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }

        self.embedding
            .validate()
            .map_err(|e| format!("embedding: {}", e))?;

        if self.retrieval.top_k == 0 {
            return Err("retrieval.top_k must be at least 1".to_string());
        }

        if self.retrieval.chunk_size == 0 {
            return Err("retrieval.chunk_size must be at least 1".to_string());
        }

        Ok(())
    }
}
