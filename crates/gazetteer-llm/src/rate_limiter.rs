//! Sliding-window limiter for outbound provider calls

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Configuration for the [`RateLimiter`]
///
/// # Examples
///
/// ```
/// use gazetteer_llm::RateLimitConfig;
///
/// let config = RateLimitConfig::default();
/// assert_eq!(config.max_calls, 10);
/// assert_eq!(config.window_secs, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum calls allowed inside any trailing window
    /// Default: 10
    pub max_calls: usize,

    /// Length of the sliding window (in seconds)
    /// Default: 60
    pub window_secs: u64,

    /// Extra wait added once the oldest call expires (in milliseconds)
    /// Default: 100
    pub safety_margin_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 10,
            window_secs: 60,
            safety_margin_ms: 100,
        }
    }
}

impl RateLimitConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the safety margin as a Duration
    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_calls == 0 {
            return Err("max_calls must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("window_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Shared sliding-window rate limiter
///
/// Keeps the instants of the calls made in the last window. [`acquire`]
/// suspends until fewer than `max_calls` instants remain in the window and
/// then records a new one. Pruning, the saturation check, waiting and
/// recording all happen while holding one lock, so concurrent callers can
/// never jointly overshoot the limit. The lock queues waiters in arrival
/// order, and the oldest call is always the first to expire.
///
/// [`acquire`]: RateLimiter::acquire
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given configuration
    ///
    /// A `max_calls` of 0 would block every caller forever and is raised to 1.
    pub fn new(mut config: RateLimitConfig) -> Self {
        if config.max_calls == 0 {
            warn!("[RateLimit] max_calls is 0, allowing 1 call per {}s", config.window_secs);
            config.max_calls = 1;
        }
        let capacity = config.max_calls;
        Self {
            config,
            window: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Create a limiter allowing `max_calls` per 60 seconds
    pub fn per_minute(max_calls: usize) -> Self {
        Self::new(RateLimitConfig {
            max_calls,
            ..Default::default()
        })
    }

    /// Get the limiter configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until one more call is allowed, then record it
    ///
    /// Returns the total time spent waiting for the window to open.
    pub async fn acquire(&self) -> Duration {
        let mut window = self.window.lock().await;
        let mut waited = Duration::ZERO;

        loop {
            let now = Instant::now();
            self.prune(&mut window, now);

            if window.len() < self.config.max_calls {
                window.push_back(now);
                debug!(in_window = window.len(), "Rate limiter slot acquired");
                return waited;
            }

            let wait = match window.front() {
                Some(oldest) => {
                    (*oldest + self.config.window()).saturating_duration_since(now)
                        + self.config.safety_margin()
                }
                None => self.config.safety_margin(),
            };

            info!(
                "[RateLimit] Waiting {:.1}s to respect {} calls per {}s",
                wait.as_secs_f64(),
                self.config.max_calls,
                self.config.window_secs
            );
            sleep(wait).await;
            waited += wait;
        }
    }

    /// Number of calls currently inside the window
    pub async fn in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        self.prune(&mut window, Instant::now());
        window.len()
    }

    fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
        let span = self.config.window();
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= span {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_config_is_valid() {
        let config = RateLimitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window(), Duration::from_secs(60));
        assert_eq!(config.safety_margin(), Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_config() {
        let config = RateLimitConfig {
            max_calls: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RateLimitConfig {
            window_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_under_limit_does_not_wait() {
        let limiter = RateLimiter::per_minute(3);

        for _ in 0..3 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_window_waits_for_oldest_call() {
        let limiter = RateLimiter::per_minute(2);
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.acquire().await;

        let waited = limiter.acquire().await;

        // Oldest call was 10s ago: 50s until it expires, plus the margin
        assert_eq!(waited, Duration::from_secs(50) + Duration::from_millis(100));
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_still_admits_calls() {
        let limiter = RateLimiter::per_minute(0);
        assert_eq!(limiter.config().max_calls, 1);
        assert_eq!(limiter.acquire().await, Duration::ZERO);

        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::from_secs(60) + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expires() {
        let limiter = RateLimiter::per_minute(2);
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.in_window().await, 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.in_window().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::per_minute(3));
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            let stamps = Arc::clone(&stamps);
            tasks.push(tokio::spawn(async move {
                limiter.acquire().await;
                stamps.lock().unwrap().push(Instant::now());
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut stamps = stamps.lock().unwrap().clone();
        stamps.sort();
        assert_eq!(stamps.len(), 10);

        // Every trailing 60s window holds at most 3 acquisitions
        for (i, end) in stamps.iter().enumerate() {
            let in_window = stamps[..=i]
                .iter()
                .filter(|t| end.duration_since(**t) < Duration::from_secs(60))
                .count();
            assert!(in_window <= 3, "window ending at #{} held {}", i, in_window);
        }
    }
}
