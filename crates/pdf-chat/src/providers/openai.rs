//! Client for the hosted OpenAI-compatible API, with retry logic

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{OpenAiConfig, API_KEY_ENV};
use crate::error::{Error, Result};
use crate::types::ChatMessage;

use super::embedding::EmbeddingProvider;
use super::llm::ChatModel;

/// Upper bound on a single backoff sleep
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// A failed attempt, tagged with whether it is worth retrying
struct Failure {
    error: Error,
    retryable: bool,
}

/// HTTP client for the hosted API with automatic retry
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_base: Duration,
}

impl OpenAiClient {
    /// Create a new client; fails without an API key
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", API_KEY_ENV)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            retry_base: Duration::from_secs(1),
        })
    }

    /// Override the first backoff delay (doubles on each retry)
    pub fn with_retry_base(mut self, delay: Duration) -> Self {
        self.retry_base = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, Failure>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    let delay = backoff_delay(self.retry_base, attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        failure.error,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    /// POST a JSON body and decode the JSON reply
    async fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        kind: fn(String) -> Error,
    ) -> Result<Resp>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let url = &url;
        let client = &self.client;
        let api_key = self.api_key.as_str();

        self.retry_request(move || async move {
            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| Failure {
                    error: kind(format!("Request to {} failed: {}", path, e)),
                    retryable: true,
                })?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = api_error_message(&text).unwrap_or(text);
                return Err(Failure {
                    error: kind(format!("HTTP {} from {}: {}", status, path, message)),
                    retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
                });
            }

            response.json::<Resp>().await.map_err(|e| Failure {
                error: kind(format!("Failed to parse {} response: {}", path, e)),
                retryable: false,
            })
        })
        .await
    }

    /// Check if the API is reachable with our credentials
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Exponential backoff, capped at [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// Pull `error.message` out of an API error body
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Hosted embedding provider
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder with its own client
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OpenAiClient::new(config)?),
            config.embed_model.clone(),
            config.embed_batch_size,
        ))
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, model: String, batch_size: usize) -> Self {
        Self {
            client,
            model,
            batch_size: batch_size.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = EmbeddingsRequest {
                model: &self.model,
                input: batch,
            };
            let response: EmbeddingsResponse = self
                .client
                .post_json("embeddings", &request, Error::Embedding)
                .await?;

            if response.data.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.data.len()
                )));
            }

            let mut data = response.data;
            data.sort_by_key(|d| d.index);
            embeddings.extend(data.into_iter().map(|d| d.embedding));
        }

        tracing::debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(embeddings)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Hosted chat model
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Create a new chat model with its own client
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OpenAiClient::new(config)?),
            config.chat_model.clone(),
            config.temperature,
        ))
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        tracing::debug!("Chat completion with {} ({} messages)", self.model, messages.len());

        let response: ChatResponse = self
            .client
            .post_json("chat/completions", &request, Error::Llm)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::llm("Chat completion returned no content"))
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
