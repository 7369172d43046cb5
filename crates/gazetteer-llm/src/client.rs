//! Rate-limited query client
//!
//! Every call to the text-generation service goes through [`QueryClient::ask`].
//! The client never returns an error: failures of any kind become
//! [`QueryOutcome::Unavailable`], which callers treat as a soft "no result".

use crate::RateLimiter;
use gazetteer_domain::{LlmProvider, ProviderError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Configuration for the [`QueryClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum time a single provider call may take (in seconds)
    /// Default: 120
    pub request_timeout_secs: u64,

    /// How many quota rejections are retried before giving up
    /// Default: 4
    pub max_rate_limit_retries: u32,

    /// First backoff after a quota rejection (in seconds)
    /// Default: 10
    pub initial_backoff_secs: u64,

    /// Upper bound for the doubling backoff (in seconds)
    /// Default: 80
    pub max_backoff_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            max_rate_limit_retries: 4,
            initial_backoff_secs: 10,
            max_backoff_secs: 80,
        }
    }
}

impl QueryConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.initial_backoff_secs > self.max_backoff_secs {
            return Err("initial_backoff_secs cannot exceed max_backoff_secs".to_string());
        }
        Ok(())
    }
}

/// Outcome of a single [`QueryClient::ask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The service produced non-empty text (trimmed)
    Answered(String),
    /// No usable result; the reason is for logs and failure reports
    Unavailable {
        /// Why the call produced nothing
        reason: String,
    },
}

impl QueryOutcome {
    /// True if the service produced text
    pub fn is_answered(&self) -> bool {
        matches!(self, QueryOutcome::Answered(_))
    }

    /// The answer text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            QueryOutcome::Answered(text) => Some(text),
            QueryOutcome::Unavailable { .. } => None,
        }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        QueryOutcome::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Quota-aware wrapper around an [`LlmProvider`]
///
/// Each attempt consumes exactly one limiter slot, whether it succeeds or not,
/// since the request was sent either way.
///
/// # Examples
///
/// ```
/// use gazetteer_llm::{MockProvider, QueryClient, QueryConfig, RateLimiter};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = Arc::new(RateLimiter::per_minute(10));
/// let client = QueryClient::new(MockProvider::new("[\"Asia\"]"), limiter, QueryConfig::default());
///
/// let outcome = client.ask("List continents").await;
/// assert_eq!(outcome.text(), Some("[\"Asia\"]"));
/// # }
/// ```
pub struct QueryClient<L: LlmProvider> {
    provider: L,
    limiter: Arc<RateLimiter>,
    config: QueryConfig,
    attempts: AtomicUsize,
}

impl<L: LlmProvider> QueryClient<L> {
    /// Create a client sharing `limiter` with every other client of the run
    pub fn new(provider: L, limiter: Arc<RateLimiter>, config: QueryConfig) -> Self {
        Self {
            provider,
            limiter,
            config,
            attempts: AtomicUsize::new(0),
        }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Total attempts sent so far, retries included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Ask the service for a completion
    pub async fn ask(&self, prompt: &str) -> QueryOutcome {
        let max_backoff = Duration::from_secs(self.config.max_backoff_secs);
        let mut backoff = Duration::from_secs(self.config.initial_backoff_secs).min(max_backoff);
        let mut rate_limited = 0;

        loop {
            self.limiter.acquire().await;
            self.attempts.fetch_add(1, Ordering::Relaxed);

            let result = timeout(self.config.request_timeout(), self.provider.generate(prompt)).await;

            match result {
                Err(_) => {
                    warn!(
                        model = self.provider.model_name(),
                        "Request timed out after {}s", self.config.request_timeout_secs
                    );
                    return QueryOutcome::unavailable(format!(
                        "Request timed out after {}s",
                        self.config.request_timeout_secs
                    ));
                }
                Ok(Ok(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        warn!(model = self.provider.model_name(), "Empty response");
                        return QueryOutcome::unavailable("Empty response");
                    }
                    debug!(chars = text.len(), "Response received");
                    return QueryOutcome::Answered(text.to_string());
                }
                Ok(Err(e)) if e.is_rate_limited() && rate_limited < self.config.max_rate_limit_retries => {
                    rate_limited += 1;
                    warn!(
                        "429 Too Many Requests. Backing off for {}s (retry {}/{})",
                        backoff.as_secs(),
                        rate_limited,
                        self.config.max_rate_limit_retries
                    );
                    sleep(backoff).await;
                    backoff = next_backoff(backoff, max_backoff);
                }
                Ok(Err(e)) => {
                    warn!(model = self.provider.model_name(), "Provider error: {}", e);
                    return QueryOutcome::unavailable(e.to_string());
                }
            }
        }
    }
}

/// Double `backoff`, capped at `max`
fn next_backoff(backoff: Duration, max: Duration) -> Duration {
    backoff.saturating_mul(2).min(max)
}
