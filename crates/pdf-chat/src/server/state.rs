//! Application state for the chat server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::providers::{ChatModel, EmbeddingProvider, OpenAiChat, OpenAiClient, OpenAiEmbedder};
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ChatConfig,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// Chat model
    llm: Arc<dyn ChatModel>,
    /// Process pipeline built from the two providers
    pipeline: Pipeline,
    /// Live sessions
    sessions: SessionStore,
    /// Whether the providers passed the last health check
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by the hosted OpenAI-compatible API
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(&config.openai)?);
        tracing::info!("OpenAI client initialized ({})", client.base_url());

        let embedder = Arc::new(OpenAiEmbedder::from_client(
            Arc::clone(&client),
            config.openai.embed_model.clone(),
            config.openai.embed_batch_size,
        ));
        let llm = Arc::new(OpenAiChat::from_client(
            client,
            config.openai.chat_model.clone(),
            config.openai.temperature,
        ));

        Self::with_providers(config, embedder, llm)
    }

    /// Create state with explicit providers
    pub fn with_providers(
        config: ChatConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let pipeline = Pipeline::new(&config, Arc::clone(&embedder), Arc::clone(&llm))?;
        tracing::info!(
            "Providers ready (embeddings: {}, chat: {} / {})",
            embedder.name(),
            llm.name(),
            llm.model()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                llm,
                pipeline,
                sessions: SessionStore::new(),
                ready: RwLock::new(false),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get chat model
    pub fn llm(&self) -> &Arc<dyn ChatModel> {
        &self.inner.llm
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Health-check both providers and record the result as the ready state
    pub async fn check_providers(&self) -> bool {
        let embedder_ok = self.inner.embedder.health_check().await.unwrap_or(false);
        let llm_ok = self.inner.llm.health_check().await.unwrap_or(false);

        if !embedder_ok {
            tracing::warn!("Embedding provider {} is not reachable", self.inner.embedder.name());
        }
        if !llm_ok {
            tracing::warn!("Chat provider {} is not reachable", self.inner.llm.name());
        }

        let ready = embedder_ok && llm_ok;
        self.set_ready(ready);
        ready
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
