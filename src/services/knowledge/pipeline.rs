//! RAG Pipeline Controller
//!
//! Owns the lifecycle state and the current index, exposes the host-facing
//! contract (startup, shutdown, configuration update, answer), and runs the
//! one-shot recovery cycle when a query fails.

use std::fmt;

use futures_util::stream::BoxStream;
use futures_util::{stream, StreamExt};
use rag_pipeline_llm::Message;
use serde::{Deserialize, Serialize};

use super::backends::Backends;
use super::corpus::CorpusSource;
use super::error::PipelineError;
use super::index::{IndexBuilder, KnowledgeIndex};
use super::query::{QueryEngine, TokenStream};
use crate::models::settings::{PipelineSettings, ReinitializePolicy};

/// Lifecycle state of a [`RagPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No build attempted since construction or shutdown.
    Uninitialized,
    /// An index is installed and served.
    Ready,
    /// The last build failed; nothing is served.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Uninitialized => write!(f, "uninitialized"),
            PipelineState::Ready => write!(f, "ready"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of [`RagPipeline::answer`].
pub enum QueryResult {
    /// The answer, streamed as the backend produces it.
    Success(TokenStream),
    /// A human-readable reason no answer could be produced.
    Failure(String),
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            QueryResult::Success(_) => None,
            QueryResult::Failure(message) => Some(message),
        }
    }

    /// Flatten into plain strings for hosts that expect a single text stream.
    ///
    /// A failure becomes a one-element stream carrying its message; an
    /// in-stream error becomes its final element.
    pub fn into_stream(self) -> BoxStream<'static, String> {
        match self {
            QueryResult::Success(tokens) => tokens
                .map(|item| match item {
                    Ok(token) => token,
                    Err(e) => e.to_string(),
                })
                .boxed(),
            QueryResult::Failure(message) => stream::once(async move { message }).boxed(),
        }
    }

    /// Drain the answer into one string, or the first error message.
    pub async fn collect_text(self) -> Result<String, String> {
        match self {
            QueryResult::Success(mut tokens) => {
                let mut text = String::new();
                while let Some(item) = tokens.next().await {
                    text.push_str(&item.map_err(|e| e.to_string())?);
                }
                Ok(text)
            }
            QueryResult::Failure(message) => Err(message),
        }
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Success(_) => f.write_str("Success(<stream>)"),
            QueryResult::Failure(message) => f.debug_tuple("Failure").field(message).finish(),
        }
    }
}

/// Backend health of the served index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// "healthy", "degraded" or "not_ready"
    pub status: String,
    pub state: PipelineState,
    pub model: Option<String>,
    pub context_window: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
    pub embedder: Option<String>,
    pub local_embeddings: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedder_error: Option<String>,
}

/// Single-index RAG pipeline.
///
/// Mutating operations take `&mut self`; callers serialize access.
pub struct RagPipeline {
    settings: PipelineSettings,
    backends: Backends,
    index: Option<KnowledgeIndex>,
    state: PipelineState,
    last_error: Option<String>,
}

impl RagPipeline {
    /// Create an uninitialized pipeline. Nothing is built.
    pub fn new(settings: PipelineSettings, backends: Backends) -> Self {
        Self {
            settings,
            backends,
            index: None,
            state: PipelineState::Uninitialized,
            last_error: None,
        }
    }

    /// Create a pipeline, building the index right away when
    /// `eager_initialize` is set. A failed eager build is returned.
    pub async fn create(
        settings: PipelineSettings,
        backends: Backends,
    ) -> Result<Self, PipelineError> {
        let eager = settings.eager_initialize;
        let mut pipeline = Self::new(settings, backends);
        if eager {
            pipeline.initialize().await?;
        }
        Ok(pipeline)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The served index, if any.
    pub fn index(&self) -> Option<&KnowledgeIndex> {
        match self.state {
            PipelineState::Ready => self.index.as_ref(),
            _ => None,
        }
    }

    /// Message of the most recent failed build.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Build a new index from the current settings and install it.
    ///
    /// On failure the state becomes `Failed` and the error is returned; the
    /// previously built index is left untouched but no longer served.
    pub async fn initialize(&mut self) -> Result<(), PipelineError> {
        match self.build_index().await {
            Ok(index) => {
                tracing::info!(index_id = index.id(), "pipeline ready");
                self.index = Some(index);
                self.state = PipelineState::Ready;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "pipeline initialization failed");
                self.state = PipelineState::Failed;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn build_index(&self) -> Result<KnowledgeIndex, PipelineError> {
        self.settings
            .validate()
            .map_err(PipelineError::InvalidConfig)?;

        let corpus = CorpusSource::from_settings(&self.settings).load();
        let model = self
            .backends
            .llm
            .create_llm(&self.settings.llm)
            .map_err(|e| PipelineError::IndexBuild(format!("model unavailable: {}", e)))?;

        IndexBuilder::new(
            self.backends.embedder.clone(),
            self.settings.embedding.clone(),
            self.settings.retrieval.chunk_size,
        )
        .build(corpus, model)
        .await
    }

    /// Host startup hook. Builds unless already `Ready`.
    pub async fn startup(&mut self) -> Result<PipelineState, PipelineError> {
        if self.state == PipelineState::Ready {
            tracing::debug!("startup: index already built");
        } else {
            tracing::info!(state = %self.state, "startup: building index");
            self.initialize().await?;
        }
        Ok(self.state)
    }

    /// Host shutdown hook. Only logs; the index lives until the process exits.
    pub async fn shutdown(&self) {
        tracing::info!(state = %self.state, "pipeline shut down");
    }

    /// Store new settings and rebuild according to `reinitialize_on_update`.
    pub async fn on_configuration_updated(
        &mut self,
        settings: PipelineSettings,
    ) -> Result<PipelineState, PipelineError> {
        self.settings = settings;

        let rebuild = match self.settings.reinitialize_on_update {
            ReinitializePolicy::Always => true,
            ReinitializePolicy::WhenNotReady => self.state != PipelineState::Ready,
        };

        if rebuild {
            tracing::info!("configuration updated; rebuilding index");
            self.initialize().await?;
        } else {
            tracing::info!("configuration updated; keeping current index");
        }
        Ok(self.state)
    }

    /// Answer a host message.
    ///
    /// Only `user_message` drives the query; an empty one falls back to the
    /// configured test query. `model_id`, `messages` and `body` are accepted
    /// for host compatibility. Never fails: errors come back as
    /// [`QueryResult::Failure`]. At most one recovery runs per call.
    pub async fn answer(
        &mut self,
        user_message: &str,
        model_id: &str,
        messages: &[Message],
        body: &serde_json::Value,
    ) -> QueryResult {
        let question = if user_message.trim().is_empty() {
            self.settings.test_query.clone()
        } else {
            user_message.to_string()
        };
        tracing::debug!(
            model_id,
            history = messages.len(),
            has_body = !body.is_null(),
            "answer requested"
        );

        let mut recovered = false;
        if self.state != PipelineState::Ready {
            if !self.settings.auto_recover_on_missing_index {
                return QueryResult::Failure(PipelineError::NotInitialized.to_string());
            }
            tracing::warn!(state = %self.state, "no index; initializing before answering");
            if let Err(e) = self.initialize().await {
                return QueryResult::Failure(recovery_failed(&e));
            }
            recovered = true;
        }

        match self.query_current(&question).await {
            Ok(tokens) => QueryResult::Success(tokens),
            Err(e) if e.triggers_recovery() && !recovered => {
                tracing::warn!(error = %e, "query failed; rebuilding index and retrying once");
                if let Err(init_err) = self.initialize().await {
                    return QueryResult::Failure(recovery_failed(&init_err));
                }
                match self.query_current(&question).await {
                    Ok(tokens) => QueryResult::Success(tokens),
                    Err(retry_err) => {
                        tracing::error!(error = %retry_err, "query failed again after recovery");
                        QueryResult::Failure(retry_err.to_string())
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "query failed");
                QueryResult::Failure(e.to_string())
            }
        }
    }

    /// Check the model and embedding backends of the served index.
    ///
    /// Without a served index nothing is contacted and the status is
    /// `not_ready`.
    pub async fn health(&self) -> HealthReport {
        let index = match self.index() {
            Some(index) => index,
            None => {
                return HealthReport {
                    status: "not_ready".to_string(),
                    state: self.state,
                    model: None,
                    context_window: None,
                    model_error: None,
                    embedder: None,
                    local_embeddings: None,
                    embedder_error: None,
                }
            }
        };

        let model = index.model();
        let embedder = index.embedder();
        let model_error = model.health_check().await.err().map(|e| e.to_string());
        let embedder_error = embedder.health_check().await.err().map(|e| e.to_string());
        let status = if model_error.is_none() && embedder_error.is_none() {
            "healthy"
        } else {
            tracing::warn!(?model_error, ?embedder_error, "backend health check failed");
            "degraded"
        };

        HealthReport {
            status: status.to_string(),
            state: self.state,
            model: Some(format!("{} ({})", model.name(), model.model())),
            context_window: Some(model.context_window()),
            model_error,
            embedder: Some(embedder.display_name().to_string()),
            local_embeddings: Some(embedder.provider_type().is_local()),
            embedder_error,
        }
    }

    async fn query_current(&self, question: &str) -> Result<TokenStream, PipelineError> {
        let index = self.index().ok_or(PipelineError::NotInitialized)?;
        QueryEngine::new(self.settings.retrieval.top_k)
            .query(index, question)
            .await
    }
}

impl fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagPipeline")
            .field("state", &self.state)
            .field("index", &self.index.as_ref().map(|index| index.id()))
            .field("last_error", &self.last_error)
            .finish()
    }
}

fn recovery_failed(error: &PipelineError) -> String {
    format!("Recovery failed: {}", error)
}
