//! Backoff policy for rate-limited embedding calls.

use std::time::Duration;

/// Bounded exponential backoff used when the embedding provider rate limits.
///
/// Only [`EmbeddingError::RateLimited`](docqa_core::EmbeddingError::RateLimited)
/// is retried. When the provider supplies a retry-after hint it is used in
/// place of the computed delay, still capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.initial_delay.saturating_mul(factor)
        });
        delay.min(self.max_delay)
    }
}
