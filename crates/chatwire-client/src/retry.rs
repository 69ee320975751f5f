use std::time::Duration;

use rand::Rng;

/// Exponential backoff with multiplicative jitter.
///
/// The delay before retry `n` (0-based) is `2^n * base_wait`, scaled by a
/// random factor in `[0.9, 1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_wait: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Whether a failure on `attempt` (0-based) may be retried.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Un-jittered backoff for `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_wait.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.9..1.0);
        self.backoff(attempt).mul_f64(jitter)
    }
}
