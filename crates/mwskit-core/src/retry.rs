//! Bounded retry policy for throttled requests.

use std::time::Duration;

/// Limits on how long a throttled request keeps retrying.
///
/// Every retry waits the same fixed `backoff`. Total attempts =
/// `max_retries + 1`. A retry is also refused when its backoff would push the
/// accumulated waiting past `max_elapsed`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: Duration,
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff: Duration::from_secs(10),
            max_elapsed: Some(Duration::from_secs(300)),
        }
    }
}

impl RetryConfig {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: delay,
            ..Self::default()
        }
    }

    /// Never retry; the first throttled response ends the request.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Option<Duration>) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Backoff to apply before retry `attempt`, or `None` when the budget is spent.
    pub fn next_delay(&self, attempt: u32, waited: Duration) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        match self.max_elapsed {
            Some(ceiling) if waited.saturating_add(self.backoff) > ceiling => None,
            _ => Some(self.backoff),
        }
    }
}
