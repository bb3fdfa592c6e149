//! Retry policy with linear backoff

use std::time::Duration;

use super::FetchError;

/// Which non-success HTTP statuses are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusRetry {
    /// Every non-2xx status is retried
    #[default]
    All,
    /// Only 5xx, 408 (request timeout) and 429 (too many requests)
    ServerErrorsOnly,
}

impl StatusRetry {
    fn allows(self, status: u16) -> bool {
        match self {
            StatusRetry::All => true,
            StatusRetry::ServerErrorsOnly => status >= 500 || status == 408 || status == 429,
        }
    }
}

/// Configuration for the attempt loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry; later retries wait `base_delay * attempt`
    pub base_delay: Duration,
    /// Which statuses are retried
    pub status_retry: StatusRetry,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,                      // 1 initial + 3 retries
            base_delay: Duration::from_secs(1),
            status_retry: StatusRetry::All,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Number of attempts to make, never less than one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given 1-based attempt failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether a failed attempt should be followed by another one
    pub fn should_retry(&self, err: &FetchError) -> bool {
        match err {
            FetchError::Network(_) => true,
            FetchError::HttpStatus { status, .. } => self.status_retry.allows(*status),
            _ => false,
        }
    }
}
