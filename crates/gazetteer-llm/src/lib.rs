//! Gazetteer LLM Provider Layer
//!
//! Text-generation providers plus the quota-aware query path every harvest
//! request goes through.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from
//! `gazetteer-domain` and wraps them in a [`QueryClient`] that:
//!
//! - waits on a shared [`RateLimiter`] before every attempt
//! - bounds each call with a timeout
//! - backs off and retries on quota rejections
//! - converts every failure into a soft [`QueryOutcome::Unavailable`]
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `CohereProvider`: Cohere chat API integration
//!
//! # Examples
//!
//! ```
//! use gazetteer_llm::MockProvider;
//! use gazetteer_domain::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod cohere;
pub mod rate_limiter;

use async_trait::async_trait;
use gazetteer_domain::{LlmProvider, ProviderError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use client::{QueryClient, QueryConfig, QueryOutcome};
pub use cohere::CohereProvider;
pub use rate_limiter::{RateLimitConfig, RateLimiter};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl ProviderError for LlmError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimitExceeded)
    }
}

/// Scripted reply for a single prompt
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, Reply>,
    rate_limited: HashMap<String, usize>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Responses are keyed by the exact prompt, so concurrent callers get
/// deterministic answers regardless of scheduling.
///
/// # Examples
///
/// ```
/// use gazetteer_llm::MockProvider;
/// use gazetteer_domain::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").await.unwrap(), "Fixed response");
///
/// // Multiple responses
/// let provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response("prompt2", "response2");
/// assert_eq!(provider.generate("prompt1").await.unwrap(), "response1");
/// assert_eq!(provider.generate("prompt2").await.unwrap(), "response2");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Delay every reply, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&self, prompt: impl Into<String>, response: impl Into<String>) {
        self.state()
            .responses
            .insert(prompt.into(), Reply::Text(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&self, prompt: impl Into<String>) {
        self.state().responses.insert(prompt.into(), Reply::Error);
    }

    /// Reject a prompt with a quota error `times` times before answering it
    pub fn add_rate_limited(&self, prompt: impl Into<String>, times: usize) {
        self.state().rate_limited.insert(prompt.into(), times);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Number of calls made with exactly this prompt
    pub fn calls_for(&self, prompt: &str) -> usize {
        self.state().prompts.iter().filter(|p| *p == prompt).count()
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let reply = {
            let mut state = self.state();
            state.prompts.push(prompt.to_string());

            if let Some(remaining) = state.rate_limited.get_mut(prompt) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(LlmError::RateLimitExceeded);
                }
            }

            state
                .responses
                .get(prompt)
                .cloned()
                .unwrap_or_else(|| Reply::Text(self.default_response.clone()))
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Error => Err(LlmError::Other("Mock error".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").await.unwrap(), "world");
        assert_eq!(provider.generate("foo").await.unwrap(), "bar");
        assert_eq!(provider.generate("unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").await.unwrap();
        provider.generate("prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.calls_for("prompt2"), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt").await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_rate_limited_then_answers() {
        let provider = MockProvider::new("ok");
        provider.add_rate_limited("busy", 2);

        let first = provider.generate("busy").await.unwrap_err();
        assert!(first.is_rate_limited());
        assert!(provider.generate("busy").await.unwrap_err().is_rate_limited());
        assert_eq!(provider.generate("busy").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_history() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").await.unwrap();

        // Both should share the same history due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_error_classification() {
        assert!(LlmError::RateLimitExceeded.is_rate_limited());
        assert!(!LlmError::Communication("reset".into()).is_rate_limited());
        assert!(!LlmError::ModelNotAvailable("command-r".into()).is_rate_limited());
    }
}
