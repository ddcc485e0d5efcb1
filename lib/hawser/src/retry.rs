use std::time::Duration;

use hawser_core::{Response, Result};

/// Fixed-delay retry policy for one client.
///
/// `max_retries` counts retries, not attempts: a value of 2 allows up to
/// three sends. The delay between attempts is constant, with no backoff or
/// jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Build a policy from the resolved retry count and delay.
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// The fixed delay slept before each retry.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The maximum number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether the outcome of attempt number `attempt` (zero-based) should
    /// be retried.
    ///
    /// Connection, TLS and timeout failures are retryable, as are 5xx
    /// statuses whether they surface as a validation error or as an
    /// accepted response. Everything else - including every 4xx - fails
    /// immediately.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, outcome: &Result<Response>) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match outcome {
            Ok(response) => response.status() >= 500,
            Err(error) => error.is_retryable(),
        }
    }
}
