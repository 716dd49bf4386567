//! Client retransmission policy: bounded exponential backoff.

use std::time::Duration;

use types::{DEFAULT_INITIAL_TIMEOUT_MS, DEFAULT_MAX_RETRIES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout_ms: DEFAULT_INITIAL_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Timeout to wait before retransmitting after `attempt` prior sends
    /// (`attempt` 0 is the timeout after the first, original send).
    pub fn timeout_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.initial_timeout_ms.saturating_mul(1u64 << attempt.min(32));
        Duration::from_millis(millis)
    }

    /// Total sends allowed: the original plus `max_retries` retransmits.
    pub fn max_sends(&self) -> u32 {
        self.max_retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_attempt() {
        let policy = RetryPolicy {
            initial_timeout_ms: 500,
            max_retries: 5,
        };
        let expected = [500u64, 1000, 2000, 4000, 8000, 16000];
        for (attempt, &exp) in expected.iter().enumerate() {
            assert_eq!(
                policy.timeout_for_attempt(attempt as u32),
                Duration::from_millis(exp)
            );
        }
    }
}
