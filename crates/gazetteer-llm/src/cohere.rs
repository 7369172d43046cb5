//! Cohere Provider Implementation
//!
//! Provides integration with Cohere's chat API, the text-generation service the
//! harvester enumerates its hierarchy from.
//!
//! # Features
//!
//! - Async HTTP communication with the chat endpoint
//! - Configurable endpoint, model and decoding parameters
//! - Quota rejections (HTTP 429) surfaced as [`LlmError::RateLimitExceeded`]
//! - Client-side timeout
//!
//! Retries happen in [`crate::QueryClient`], which owns the
//! shared rate limiter.
//!
//! # Examples
//!
//! ```no_run
//! use gazetteer_llm::CohereProvider;
//!
//! let provider = CohereProvider::new("api-key", "command-r")
//!     .unwrap()
//!     .with_temperature(0.3);
//! ```

use crate::LlmError;
use async_trait::async_trait;
use gazetteer_domain::LlmProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Cohere API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.cohere.com";

/// Default model
pub const DEFAULT_MODEL: &str = "command-r";

/// Default HTTP timeout for provider requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default response-size ceiling in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Cohere chat API provider
pub struct CohereProvider {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

/// Request body for the chat API
#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// Response from the chat API
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: Option<String>,
}

impl CohereProvider {
    /// Create a new Cohere provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: Cohere API key
    /// - `model`: Model to use (e.g., "command-r")
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit HTTP timeout
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature, clamped to `[0.0, 1.0]`
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set the response-size ceiling in tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Send one chat request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The service rejects the call because of its quota (HTTP 429)
    /// - The model is not available (HTTP 404)
    /// - Network communication fails or any other status is returned
    /// - The response body cannot be decoded
    pub async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat", self.endpoint);

        let request_body = ChatRequest {
            message: prompt,
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = chat.text.unwrap_or_default();
        debug!(model = %self.model, chars = text.len(), "Chat response received");
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.chat(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
