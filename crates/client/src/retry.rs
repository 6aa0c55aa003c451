//! Retry strategy for transient (no-response) failures.

use std::time::Duration;

use crate::error::TransportError;

pub trait RetryPolicy: Send + Sync {
    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn next_delay(&self, attempt: u32, error: &TransportError) -> Option<Duration>;
}

/// Up to `retries` extra attempts, each after the same `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    pub retries: u32,
    pub delay: Duration,
}

impl FixedDelay {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay(&self, attempt: u32, _error: &TransportError) -> Option<Duration> {
        (attempt <= self.retries).then_some(self.delay)
    }
}
