//! OpenAI Provider Implementation
//!
//! Talks to any OpenAI-compatible `/chat/completions` and `/embeddings`
//! endpoint.
//!
//! # Features
//!
//! - Async HTTP communication with bearer-token auth
//! - Configurable endpoint, model, temperature and token limit
//! - Retry logic with exponential backoff for transport errors, 5xx and 429
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use geoeval_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env(
//!     "https://api.openai.com/v1",
//!     "gpt-4o",
//!     "OPENAI_API_KEY",
//! ).unwrap();
//!
//! // `complete` and `embedding` are async; the `CompletionProvider` and
//! // `EmbeddingProvider` impls block the calling thread.
//! ```

use crate::LlmError;
use geoeval_domain::{CompletionProvider, EmbeddingProvider};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default timeout for completion requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// OpenAI-compatible chat completions client
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    embedding_model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL, without the `/chat/completions` suffix
    /// - `model`: Model to use (e.g., "gpt-4o")
    /// - `api_key`: Bearer token
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: api_key.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Create a provider whose API key is read from the environment variable `key_var`
    pub fn from_env(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        key_var: &str,
    ) -> Result<Self, LlmError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| LlmError::Other(format!("environment variable {} is not set", key_var)))?;
        Ok(Self::new(endpoint, model, api_key))
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the completion length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Use a different model for embeddings
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Model name sent with each completion request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion for `prompt`, optionally preceded by a system message
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The service is unreachable after all retries
    /// - The model is not available (404)
    /// - The service keeps rate limiting (429)
    /// - The response has no message content
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let body: ChatResponse = self.post("chat/completions", &self.model, &request_body).await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))
    }

    /// Embed `text` with the embedding model
    pub async fn embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request_body = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let body: EmbeddingResponse = self
            .post("embeddings", &self.embedding_model, &request_body)
            .await?;
        body.data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("response has no embedding".to_string()))
    }

    async fn post<B, R>(&self, path: &str, model: &str, request_body: &B) -> Result<R, LlmError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, path);

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(model.to_string()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        let error = LlmError::Communication(format!("HTTP {}: {}", status, error_text));
                        if status.is_client_error() {
                            return Err(error);
                        }
                        last_error = Some(error);
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                debug!("Request to {} failed (attempt {}), retrying in {:?}", path, attempts, delay);
                tokio::time::sleep(delay).await;
            }
        }

        let error = last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string()));
        warn!("Request to {} failed after {} attempts: {}", path, attempts, error);
        Err(error)
    }
}

/// Drive `future` to completion from synchronous code
///
/// Workers of a multi-threaded runtime go through `block_in_place`. Inside a
/// current-thread runtime the future runs on a scoped thread with its own
/// runtime, since blocking there would stall the caller's executor.
pub(crate) fn block_on<F, T>(future: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>> + Send,
    T: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(move || standalone_runtime()?.block_on(future))
                .join()
                .unwrap_or_else(|_| Err(LlmError::Other("request thread panicked".to_string())))
        }),
        Err(_) => standalone_runtime()?.block_on(future),
    }
}

fn standalone_runtime() -> Result<Runtime, LlmError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))
}

impl CompletionProvider for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        block_on(self.complete(None, prompt))
    }

    fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        block_on(self.complete(Some(system), prompt))
    }
}

impl EmbeddingProvider for OpenAiProvider {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        block_on(self.embedding(text))
    }
}
